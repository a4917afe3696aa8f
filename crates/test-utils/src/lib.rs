//! Fixtures shared by the test suites of the workspace.

mod arb;
pub mod chain;

pub use arb::ArbitraryGenerator;

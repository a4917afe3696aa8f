//! Process-wide utilities shared by the arbor crates.

pub mod logging;

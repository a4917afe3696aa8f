//! Backend-independent test suites for the database traits.
//!
//! Each suite is a set of `pub fn test_*(db: &impl Trait)` functions plus a macro that turns
//! them into `#[test]`s for a given setup expression.

pub mod checkpoint_tests;

#[cfg(test)]
mod stub_tests {
    use arbor_db_types::stubs::StubCheckpointDb;

    crate::checkpoint_db_tests!(StubCheckpointDb::new());
}

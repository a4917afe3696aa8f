mod checkpoint;

pub use checkpoint::StubCheckpointDb;

//! Plumbing shared by the storage layers: running blocking database calls on a thread pool and
//! handing results back to async callers.

pub mod exec;

// Used by the code the `exec::inst_ops*` macros expand to.

#[doc(hidden)]
pub use paste as _paste;
#[doc(hidden)]
pub use threadpool as _threadpool;
#[doc(hidden)]
pub use tokio as _tokio;
#[doc(hidden)]
pub use tracing as _tracing;

//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod blob;
mod keygen;
mod tail_logs;

pub use blob::{BlobFetch, BlobUpload};
pub use keygen::Keygen;
pub use tail_logs::TailLogs;

//! Per-tool orchestrator sessions
//!
//! Each tool owns one session value holding its file list and driving the
//! record lifecycle (Pending → Processing → Done | Error) around the
//! transforms in `snappdf-core` and the client in `snappdf-remote`.
//!
//! Sessions are single-owner state machines: all mutation goes through
//! `&mut self`, so a record cannot be removed while its batch is running,
//! and no locking is needed.

pub mod cancel;
pub mod compress;
pub mod convert;
pub mod images;
pub mod merge;
pub mod policy;
pub mod record;
pub mod save;

#[cfg(test)]
mod testutil;

pub use cancel::{cancellation, CancelHandle, CancelToken, CANCELLED_MESSAGE};
pub use compress::CompressSession;
pub use convert::ConvertSession;
pub use images::ImagePackSession;
pub use merge::{MergeSession, MIN_MERGE_FILES};
pub use policy::{InputPolicy, PolicyError, DEFAULT_MAX_FILE_BYTES};
pub use record::{FileRecord, RecordId, RecordStatus, SourceFile};
pub use save::{save_result, SaveError};

use thiserror::Error;

/// Failures surfaced by the atomic-job sessions (merge, image pack).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying transform failed; message verbatim.
    #[error("{0}")]
    Job(String),

    #[error("Need at least {required} files, have {actual}")]
    NotReady { required: usize, actual: usize },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

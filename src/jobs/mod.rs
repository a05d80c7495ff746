//! Generation jobs: submission, bounded status polling, and the
//! finished-video library.

pub mod library;
pub mod models;
pub mod poller;

pub use library::{LibraryError, VideoLibrary};
pub use models::{
    GenerationParams, JobHandle, JobOutcome, JobSnapshot, JobStatus, JobUpdate, VideoEntry,
};
pub use poller::{JobPoller, JobStream, SubmitError};

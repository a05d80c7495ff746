//! Session ownership: models, persistence, and the authority that is
//! the sole writer of authenticated state.

pub mod authority;
pub mod models;
pub mod storage;

pub use authority::SessionAuthority;
pub use models::{Identity, Role, SessionSnapshot, SessionStatus};
pub use storage::{FileStore, MemoryStore, PersistedSession, SessionStore};

//! # oasis-client
//!
//! Client core for the Oasis content-automation dashboard. The REST
//! backend owns persistence and all heavy lifting; this crate owns the
//! stateful client-side pieces an embedding UI builds on:
//!
//! - `session`: the Session Authority — single source of truth for the
//!   authenticated identity, its persisted token, and the
//!   verify/login/register/logout lifecycle.
//! - `guard`: Guarded Navigation — render-or-redirect decisions for
//!   protected views, backed by single-flight session resolution.
//! - `jobs`: the Async Job Poller — submission validation plus a
//!   bounded, cancellable polling stream for generation jobs, and the
//!   finished-video library.
//! - `keys`: provider API-key management through the backend.
//! - `api`: the REST collaborator seam and its reqwest implementation.
//! - `config`: environment-driven configuration.
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//! use oasis_client::api::HttpBackend;
//! use oasis_client::config::Config;
//! use oasis_client::guard::NavigationGuard;
//! use oasis_client::jobs::JobPoller;
//! use oasis_client::session::{FileStore, SessionAuthority};
//!
//! # async fn wire() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let backend = Arc::new(HttpBackend::new(&config));
//! let store = Arc::new(FileStore::new(&config.session_file));
//!
//! let session = Arc::new(SessionAuthority::new(backend.clone(), store));
//! session.initialize().await;
//!
//! let guard = NavigationGuard::new(session.clone());
//! let poller = JobPoller::new(session, backend, config.polling);
//! # let _ = (guard, poller);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod jobs;
pub mod keys;
pub mod session;

pub use config::Config;
pub use error::{ApiError, AuthError, JobError, ValidationError};
pub use guard::{Decision, NavigationGuard};
pub use jobs::{JobOutcome, JobPoller, JobStatus, JobUpdate};
pub use session::{SessionAuthority, SessionStatus};

//! Error taxonomy for the client core.
//!
//! Every escalated error maps to a short, human-readable message; raw
//! transport details only appear as parenthetical diagnostics.

use thiserror::Error;

/// Errors surfaced by session operations (verify, login, register).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// The server rejected the supplied credentials or registration data.
    /// User-correctable; shown inline next to the form.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The request never completed; retryable by user action.
    #[error("could not reach the server ({message})")]
    NetworkUnavailable { message: String },

    /// A previously stored token failed verification. The session has
    /// already been downgraded to unauthenticated; callers route to login.
    #[error("session expired, please sign in again")]
    SessionExpired,
}

/// Client-side presence checks that fail before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Terminal failures of a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job service reported a terminal failure.
    #[error("generation failed: {message}")]
    Failed { message: String },

    /// The client gave up waiting. The server-side job may still finish,
    /// so the message points at the library instead of sounding fatal.
    #[error("generation is taking longer than expected; check your library later")]
    TimedOut,
}

/// Transport-level errors from the REST collaborator, mapped into the
/// public taxonomy at each call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-2xx response with whatever message the server attached.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True for failures where no authoritative server answer was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Mapping used by login and register: 4xx means the server looked at the
/// credentials and said no, anything else is a transport-or-server problem.
impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { code, message } if (400..500).contains(&code) => {
                AuthError::InvalidCredentials { message }
            }
            other => AuthError::NetworkUnavailable {
                message: other.to_string(),
            },
        }
    }
}

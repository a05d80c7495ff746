//! Wire envelopes exchanged with the Oasis REST API.

use serde::{Deserialize, Serialize};

use crate::session::models::Identity;

/// Body of `GET /auth/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub user: Identity,
}

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub user: Identity,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /video/generate`: the service acknowledges with the
/// job id it assigned.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Body of `GET /video/list`.
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    pub videos: Vec<crate::jobs::models::VideoEntry>,
}

/// Error body the API attaches to non-2xx responses. Best effort: the
/// server does not always send one.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

//! Video library pass-throughs: list finished videos, delete one.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::api::Backend;
use crate::error::ApiError;
use crate::jobs::models::VideoEntry;
use crate::session::SessionAuthority;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("you need to be signed in to browse your library")]
    NotAuthenticated,

    #[error("library request failed ({0})")]
    Backend(ApiError),
}

pub struct VideoLibrary {
    session: Arc<SessionAuthority>,
    backend: Arc<dyn Backend>,
}

impl VideoLibrary {
    pub fn new(session: Arc<SessionAuthority>, backend: Arc<dyn Backend>) -> Self {
        Self { session, backend }
    }

    pub async fn list(&self) -> Result<Vec<VideoEntry>, LibraryError> {
        let token = self.token().await?;
        self.backend
            .list_videos(&token)
            .await
            .map_err(LibraryError::Backend)
    }

    pub async fn delete(&self, video_id: &str) -> Result<(), LibraryError> {
        let token = self.token().await?;
        self.backend
            .delete_video(&token, video_id)
            .await
            .map_err(LibraryError::Backend)?;
        info!("Deleted video {}", video_id);
        Ok(())
    }

    async fn token(&self) -> Result<String, LibraryError> {
        self.session
            .bearer_token()
            .await
            .ok_or(LibraryError::NotAuthenticated)
    }
}

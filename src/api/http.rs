//! Reqwest implementation of the [`Backend`] trait.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::api::backend::Backend;
use crate::api::types::{
    AuthPayload, ErrorBody, LoginRequest, RegisterRequest, SubmitResponse, VerifyResponse,
    VideoListResponse,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::jobs::models::{GenerationParams, JobSnapshot, VideoEntry};
use crate::keys::{Provider, ProviderKeys};
use crate::session::models::Identity;

/// HTTP client for the Oasis REST API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a 2xx body, or turn the response into an [`ApiError`].
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Like [`Self::decode`] but for endpoints whose body we discard.
    async fn check(response: Response) -> Result<(), ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    fn transport(e: reqwest::Error) -> ApiError {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        debug!("GET /auth/verify");
        let response = self
            .client
            .get(self.url("/auth/verify"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;

        let body: VerifyResponse = Self::decode(response).await?;
        Ok(body.user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        debug!("POST /auth/login");
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(Self::transport)?;

        Self::decode(response).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ApiError> {
        debug!("POST /auth/register");
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&RegisterRequest {
                name,
                email,
                password,
            })
            .send()
            .await
            .map_err(Self::transport)?;

        Self::decode(response).await
    }

    async fn revoke(&self, token: &str) -> Result<(), ApiError> {
        debug!("POST /auth/logout");
        let response = self
            .client
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await
    }

    async fn submit_generation(
        &self,
        token: &str,
        params: &GenerationParams,
    ) -> Result<String, ApiError> {
        debug!("POST /video/generate");
        let response = self
            .client
            .post(self.url("/video/generate"))
            .bearer_auth(token)
            .json(&json!({
                "type": "video",
                "category": params.category,
                "content": params.content,
                "visual_prompt": params.visual_prompt,
                "style": params.style,
            }))
            .send()
            .await
            .map_err(Self::transport)?;

        let body: SubmitResponse = Self::decode(response).await?;
        Ok(body.id)
    }

    async fn job_status(&self, token: &str, job_id: &str) -> Result<JobSnapshot, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/video/generate/{job_id}/status")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::decode(response).await
    }

    async fn list_videos(&self, token: &str) -> Result<Vec<VideoEntry>, ApiError> {
        let response = self
            .client
            .get(self.url("/video/list"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport)?;

        let body: VideoListResponse = Self::decode(response).await?;
        Ok(body.videos)
    }

    async fn delete_video(&self, token: &str, video_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/video/delete"))
            .bearer_auth(token)
            .json(&json!({ "id": video_id }))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await
    }

    async fn save_keys(&self, token: &str, keys: &ProviderKeys) -> Result<(), ApiError> {
        debug!("POST /keys");
        let response = self
            .client
            .post(self.url("/keys"))
            .bearer_auth(token)
            .json(&json!({ "keys": keys }))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await
    }

    async fn test_key(
        &self,
        token: &str,
        provider: Provider,
        key: &str,
    ) -> Result<(), ApiError> {
        debug!("POST /keys/test for {provider:?}");
        let response = self
            .client
            .post(self.url("/keys/test"))
            .bearer_auth(token)
            .json(&json!({ "provider": provider, "key": key }))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await
    }
}

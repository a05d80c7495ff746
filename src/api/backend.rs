//! Trait seam over the Oasis REST API.
//!
//! The session authority, poller, and key service all talk to the
//! backend through this trait so tests can substitute a scripted
//! in-memory collaborator for the HTTP client.

use async_trait::async_trait;

use crate::api::types::AuthPayload;
use crate::error::ApiError;
use crate::jobs::models::{GenerationParams, JobSnapshot, VideoEntry};
use crate::keys::{Provider, ProviderKeys};
use crate::session::models::Identity;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Validate a stored bearer token and fetch the fresh identity.
    async fn verify(&self, token: &str) -> Result<Identity, ApiError>;

    /// Exchange credentials for an identity and a bearer token.
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError>;

    /// Create an account; a successful registration is also a login.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ApiError>;

    /// Best-effort server-side token revocation.
    async fn revoke(&self, token: &str) -> Result<(), ApiError>;

    /// Start a generation job; returns the id the service assigned.
    async fn submit_generation(
        &self,
        token: &str,
        params: &GenerationParams,
    ) -> Result<String, ApiError>;

    /// Fetch the current status snapshot of a job.
    async fn job_status(&self, token: &str, job_id: &str) -> Result<JobSnapshot, ApiError>;

    async fn list_videos(&self, token: &str) -> Result<Vec<VideoEntry>, ApiError>;

    async fn delete_video(&self, token: &str, video_id: &str) -> Result<(), ApiError>;

    /// Persist the user's provider API keys server-side.
    async fn save_keys(&self, token: &str, keys: &ProviderKeys) -> Result<(), ApiError>;

    /// Ask the backend to test one provider key. The key is only ever
    /// sent to our own backend, never to the provider directly.
    async fn test_key(&self, token: &str, provider: Provider, key: &str)
    -> Result<(), ApiError>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory backend used across the crate's tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use parking_lot::Mutex;

    use super::*;
    use crate::session::models::Role;

    pub fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            name: format!("user-{id}"),
            email: format!("{id}@example.com"),
            role,
            created_at: Utc::now(),
            avatar: None,
        }
    }

    /// Each method pops the next scripted result; an empty queue is a
    /// test bug and surfaces as a transport error.
    #[derive(Default)]
    pub struct MockBackend {
        pub verify_results: Mutex<VecDeque<Result<Identity, ApiError>>>,
        pub login_results: Mutex<VecDeque<Result<AuthPayload, ApiError>>>,
        pub register_results: Mutex<VecDeque<Result<AuthPayload, ApiError>>>,
        pub submit_results: Mutex<VecDeque<Result<String, ApiError>>>,
        pub status_results: Mutex<VecDeque<Result<JobSnapshot, ApiError>>>,
        pub list_results: Mutex<VecDeque<Result<Vec<VideoEntry>, ApiError>>>,
        /// Empty queue means success, so most tests need no scripting.
        pub test_key_results: Mutex<VecDeque<Result<(), ApiError>>>,

        pub verify_calls: AtomicUsize,
        pub submit_calls: AtomicUsize,
        pub status_calls: AtomicUsize,
        pub revoke_calls: AtomicUsize,
        pub delete_calls: AtomicUsize,
        pub save_keys_calls: AtomicUsize,
        pub test_key_calls: AtomicUsize,

        /// Simulated latency before verify answers, so tests can overlap
        /// a logout or a second guard with an in-flight verification.
        pub verify_delay: Mutex<Option<Duration>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script_verify(&self, result: Result<Identity, ApiError>) {
            self.verify_results.lock().push_back(result);
        }

        pub fn script_login(&self, result: Result<AuthPayload, ApiError>) {
            self.login_results.lock().push_back(result);
        }

        pub fn script_register(&self, result: Result<AuthPayload, ApiError>) {
            self.register_results.lock().push_back(result);
        }

        pub fn script_submit(&self, result: Result<String, ApiError>) {
            self.submit_results.lock().push_back(result);
        }

        pub fn script_status(&self, result: Result<JobSnapshot, ApiError>) {
            self.status_results.lock().push_back(result);
        }

        pub fn script_test_key(&self, result: Result<(), ApiError>) {
            self.test_key_results.lock().push_back(result);
        }

        pub fn set_verify_delay(&self, delay: Duration) {
            *self.verify_delay.lock() = Some(delay);
        }

        fn unscripted<T>() -> Result<T, ApiError> {
            Err(ApiError::Transport("mock: no scripted response".into()))
        }
    }

    #[async_trait]
    impl Backend for MockBackend {
        async fn verify(&self, _token: &str) -> Result<Identity, ApiError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.verify_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.verify_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn login(&self, _email: &str, _password: &str) -> Result<AuthPayload, ApiError> {
            self.login_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn register(
            &self,
            _name: &str,
            _email: &str,
            _password: &str,
        ) -> Result<AuthPayload, ApiError> {
            self.register_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn revoke(&self, _token: &str) -> Result<(), ApiError> {
            self.revoke_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn submit_generation(
            &self,
            _token: &str,
            _params: &GenerationParams,
        ) -> Result<String, ApiError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            self.submit_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn job_status(&self, _token: &str, _job_id: &str) -> Result<JobSnapshot, ApiError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.status_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn list_videos(&self, _token: &str) -> Result<Vec<VideoEntry>, ApiError> {
            self.list_results
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn delete_video(&self, _token: &str, _video_id: &str) -> Result<(), ApiError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn save_keys(&self, _token: &str, _keys: &ProviderKeys) -> Result<(), ApiError> {
            self.save_keys_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn test_key(
            &self,
            _token: &str,
            _provider: Provider,
            _key: &str,
        ) -> Result<(), ApiError> {
            self.test_key_calls.fetch_add(1, Ordering::SeqCst);
            self.test_key_results.lock().pop_front().unwrap_or(Ok(()))
        }
    }
}

//! Session Authority
//!
//! Single source of truth for "who is logged in". Owns the persisted
//! token and identity, drives the verify/login/register/logout
//! transitions, and hands read-only snapshots to the guard and UI.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::api::Backend;
use crate::api::types::AuthPayload;
use crate::error::{ApiError, AuthError};
use crate::session::models::{Identity, SessionSnapshot, SessionStatus};
use crate::session::storage::{PersistedSession, SessionStore};

struct SessionState {
    status: SessionStatus,
    identity: Option<Identity>,
    token: Option<String>,
    /// Bumped on every reset (logout, verification failure, fresh
    /// login). In-flight operations capture it at their start and
    /// discard their result if it has moved, so a slow verify response
    /// can never resurrect a session that was logged out underneath it.
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Unknown,
            identity: None,
            token: None,
            generation: 0,
        }
    }
}

pub struct SessionAuthority {
    backend: Arc<dyn Backend>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    /// Single-flight gate: the holder is the only caller allowed to run
    /// the initialize/verify sequence. Concurrent callers queue here and
    /// observe the resolved status instead of issuing their own request.
    resolve_gate: Mutex<()>,
}

impl SessionAuthority {
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(SessionState::new()),
            resolve_gate: Mutex::new(()),
        }
    }

    /// Resolve the session status on startup: no stored token means
    /// unauthenticated without touching the network; a stored token is
    /// verified with the server.
    pub async fn initialize(&self) -> SessionStatus {
        self.ensure_resolved().await
    }

    /// Drive the session to a resolved status, verifying a stored token
    /// if one exists. Safe to call concurrently: all callers share one
    /// verification request.
    pub async fn ensure_resolved(&self) -> SessionStatus {
        let _flight = self.resolve_gate.lock().await;

        let status = self.status().await;
        if status.is_resolved() {
            return status;
        }

        let Some(persisted) = self.store.load() else {
            debug!("No stored session, starting unauthenticated");
            let mut state = self.state.write().await;
            state.status = SessionStatus::Unauthenticated;
            state.identity = None;
            state.token = None;
            return SessionStatus::Unauthenticated;
        };

        {
            let mut state = self.state.write().await;
            state.status = SessionStatus::Verifying;
            state.token = Some(persisted.token.clone());
        }

        if let Err(e) = self.verify().await {
            warn!("Stored session verification failed: {}", e);
        }
        self.status().await
    }

    /// Verify the current token with the server. Success refreshes the
    /// cached identity; any failure clears all persisted session state.
    /// Never retried automatically — the guard decides when to re-check.
    pub async fn verify(&self) -> Result<Identity, AuthError> {
        let (token, generation) = {
            let state = self.state.read().await;
            (state.token.clone(), state.generation)
        };
        let Some(token) = token else {
            self.reset(SessionStatus::Unauthenticated).await;
            return Err(AuthError::SessionExpired);
        };

        match self.backend.verify(&token).await {
            Ok(identity) => {
                let mut state = self.state.write().await;
                if state.generation != generation {
                    debug!("Discarding verify response for a superseded session");
                    return Err(AuthError::SessionExpired);
                }
                state.status = SessionStatus::Authenticated;
                state.identity = Some(identity.clone());

                // Overwrite the stored snapshot with the fresh identity.
                if let Err(e) = self.store.save(&PersistedSession {
                    token,
                    identity: identity.clone(),
                }) {
                    warn!("Failed to persist refreshed session: {}", e);
                }

                info!("Session verified for {} ({:?})", identity.email, identity.role);
                Ok(identity)
            }
            Err(api_err) => {
                {
                    let mut state = self.state.write().await;
                    if state.generation != generation {
                        debug!("Discarding verify failure for a superseded session");
                        return Err(AuthError::SessionExpired);
                    }
                    state.generation += 1;
                    state.status = SessionStatus::Unauthenticated;
                    state.identity = None;
                    state.token = None;

                    // Cleared under the state lock so a concurrent login
                    // cannot save between the reset and the clear.
                    if let Err(e) = self.store.clear() {
                        error!("Failed to clear session storage: {}", e);
                    }
                }

                Err(match api_err {
                    ApiError::Transport(message) => AuthError::NetworkUnavailable { message },
                    _ => AuthError::SessionExpired,
                })
            }
        }
    }

    /// Exchange credentials for a session. On failure the previous
    /// session state, if any, is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let payload = self.backend.login(email, password).await?;
        info!("Login succeeded for {}", payload.user.email);
        Ok(self.install(payload).await)
    }

    /// Create an account. A successful registration establishes an
    /// authenticated session immediately, no separate login step.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let payload = self.backend.register(name, email, password).await?;
        info!("Registration succeeded for {}", payload.user.email);
        Ok(self.install(payload).await)
    }

    /// Clear the session locally and fire a best-effort server-side
    /// revocation that never blocks the local transition.
    pub async fn logout(&self) {
        let token = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.status = SessionStatus::Unauthenticated;
            state.identity = None;
            let token = state.token.take();

            if let Err(e) = self.store.clear() {
                error!("Failed to clear session storage on logout: {}", e);
            }
            token
        };

        if let Some(token) = token {
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                if let Err(e) = backend.revoke(&token).await {
                    debug!("Server-side token revocation failed: {}", e);
                }
            });
        }

        info!("Logged out");
    }

    async fn install(&self, payload: AuthPayload) -> Identity {
        let AuthPayload { user, token } = payload;

        let mut state = self.state.write().await;
        state.generation += 1;
        state.status = SessionStatus::Authenticated;
        state.identity = Some(user.clone());
        state.token = Some(token.clone());

        if let Err(e) = self.store.save(&PersistedSession {
            token,
            identity: user.clone(),
        }) {
            warn!("Failed to persist session: {}", e);
        }

        user
    }

    async fn reset(&self, status: SessionStatus) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.status = status;
        state.identity = None;
        state.token = None;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            status: state.status,
            identity: state.identity.clone(),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status
    }

    pub async fn is_authenticated(&self) -> bool {
        self.status().await == SessionStatus::Authenticated
    }

    pub async fn is_admin(&self) -> bool {
        self.snapshot().await.is_admin()
    }

    /// Current bearer token, re-read on every call. Callers must not
    /// cache it across suspension points: login and logout can change
    /// it at any await.
    pub async fn bearer_token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }
}

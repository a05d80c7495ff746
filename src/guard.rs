//! Guarded Navigation
//!
//! Decides, per navigation to a protected view, whether to render it or
//! redirect. The guard only ever *returns* a decision — performing the
//! navigation stays with the caller, which keeps the session authority
//! and the routing layer independently testable.

use std::sync::Arc;

use tracing::warn;

use crate::session::SessionAuthority;
use crate::session::models::{Role, SessionSnapshot};

/// Outcome of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render,
    /// Not authenticated. The originally requested path is preserved so
    /// a successful login can return the user to it.
    RedirectToLogin { return_to: String },
    /// Authenticated but under-privileged. A silent redirect to the
    /// default authenticated landing page, not an error page.
    RedirectToDefault,
}

/// Pure decision over a resolved session snapshot.
pub fn decide(snapshot: &SessionSnapshot, path: &str, required_role: Option<Role>) -> Decision {
    if !snapshot.is_authenticated() {
        return Decision::RedirectToLogin {
            return_to: path.to_string(),
        };
    }

    if let Some(required) = required_role {
        let role = snapshot
            .identity
            .as_ref()
            .map(|identity| identity.role)
            .unwrap_or(Role::User);
        if !role.satisfies(required) {
            return Decision::RedirectToDefault;
        }
    }

    Decision::Render
}

pub struct NavigationGuard {
    session: Arc<SessionAuthority>,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionAuthority>) -> Self {
        Self { session }
    }

    /// Guard a navigation to `path`. Resolves the session first if it
    /// has not been checked yet; concurrent guards for other views
    /// attach to the same in-flight verification instead of issuing
    /// their own. The future stays pending while that verification is
    /// in flight — callers show their loading placeholder until it
    /// resolves.
    pub async fn guard(&self, path: &str, required_role: Option<Role>) -> Decision {
        self.session.ensure_resolved().await;

        let snapshot = self.session.snapshot().await;
        let decision = decide(&snapshot, path, required_role);

        if decision == Decision::RedirectToDefault {
            warn!(
                "Access denied: {} requires {:?} privileges",
                path, required_role
            );
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::api::backend::mock::{MockBackend, identity};
    use crate::error::ApiError;
    use crate::session::models::SessionStatus;
    use crate::session::storage::{MemoryStore, PersistedSession, SessionStore};

    fn snapshot(status: SessionStatus, role: Option<Role>) -> SessionSnapshot {
        SessionSnapshot {
            status,
            identity: role.map(|role| identity("1", role)),
        }
    }

    #[test]
    fn unauthenticated_redirects_to_login_with_return_path() {
        let decision = decide(
            &snapshot(SessionStatus::Unauthenticated, None),
            "/videos",
            None,
        );
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                return_to: "/videos".into()
            }
        );
    }

    #[test]
    fn non_admin_on_admin_path_redirects_to_default_not_login() {
        let decision = decide(
            &snapshot(SessionStatus::Authenticated, Some(Role::User)),
            "/admin/users",
            Some(Role::Admin),
        );
        assert_eq!(decision, Decision::RedirectToDefault);
    }

    #[test]
    fn admin_renders_admin_path() {
        let decision = decide(
            &snapshot(SessionStatus::Authenticated, Some(Role::Admin)),
            "/admin/users",
            Some(Role::Admin),
        );
        assert_eq!(decision, Decision::Render);
    }

    #[test]
    fn authenticated_user_renders_unrestricted_path() {
        let decision = decide(
            &snapshot(SessionStatus::Authenticated, Some(Role::User)),
            "/dashboard",
            None,
        );
        assert_eq!(decision, Decision::Render);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_guards_share_a_single_verify_call() {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(MemoryStore::new());
        store
            .save(&PersistedSession {
                token: "t0".into(),
                identity: identity("1", Role::User),
            })
            .unwrap();

        backend.set_verify_delay(Duration::from_millis(20));
        backend.script_verify(Ok(identity("1", Role::User)));

        let session = Arc::new(SessionAuthority::new(backend.clone(), store));
        let guard = NavigationGuard::new(session);

        let (a, b) = tokio::join!(
            guard.guard("/dashboard", None),
            guard.guard("/videos", None)
        );

        assert_eq!(a, Decision::Render);
        assert_eq!(b, Decision::Render);
        assert_eq!(backend.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn guard_with_invalid_stored_token_redirects_to_login() {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(MemoryStore::new());
        store
            .save(&PersistedSession {
                token: "stale".into(),
                identity: identity("1", Role::User),
            })
            .unwrap();

        backend.script_verify(Err(ApiError::Status {
            code: 401,
            message: "expired".into(),
        }));

        let session = Arc::new(SessionAuthority::new(backend, store));
        let guard = NavigationGuard::new(session);

        assert_eq!(
            guard.guard("/videos", None).await,
            Decision::RedirectToLogin {
                return_to: "/videos".into()
            }
        );
    }
}

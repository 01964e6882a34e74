//! Session state: the bearer token and signed-in user, owned by one [`Session`] handle.
//!
//! All reads and writes of the persisted keys go through this type. Changes are
//! published on a broadcast channel so views can react to sign-in, sign-out and
//! writes made by other processes sharing the same store.

use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};

use crate::{
    domain::{LoginResponse, SessionUser},
    storage::{MemoryStore, SessionStore},
};

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(SessionUser),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    Logout,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(SessionUser),
    SignedOut(SignOutReason),
    /// The store changed underneath us and the state was re-evaluated.
    Changed(AuthState),
}

/// Where the user currently is and how to send them to the login screen.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn redirect(&self, route: &str);
}

/// Navigator for a terminal front end: tracks the route and logs the redirect.
#[derive(Debug)]
pub struct CliNavigator {
    route: Mutex<String>,
}

impl CliNavigator {
    pub fn new(route: impl Into<String>) -> Self {
        CliNavigator {
            route: Mutex::new(route.into()),
        }
    }
}

impl Default for CliNavigator {
    fn default() -> Self {
        CliNavigator::new("/")
    }
}

impl Navigator for CliNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn redirect(&self, route: &str) {
        tracing::warn!(%route, "session ended, sign in again with `ebook_portal login`");
        *self.route.lock().unwrap_or_else(|e| e.into_inner()) = route.to_string();
    }
}

struct Inner {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    events: broadcast::Sender<SessionEvent>,
    seen_revision: AtomicU64,
    // held across multi-key writes so the watcher never sees half of one
    write_lock: tokio::sync::Mutex<()>,
}

/// Cheap to clone; all clones share the store and the event channel.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("login_route", &self.inner.login_route)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Session {
            inner: Arc::new(Inner {
                store,
                navigator,
                login_route: login_route.into(),
                events,
                seen_revision: AtomicU64::new(0),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Empty in-memory session, for public-only use.
    pub fn in_memory() -> Self {
        Session::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CliNavigator::default()),
            DEFAULT_LOGIN_ROUTE,
        )
    }

    pub fn login_route(&self) -> &str {
        &self.inner.login_route
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Token, if one is stored and non-empty.
    pub async fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(self
            .inner
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|t| !t.trim().is_empty()))
    }

    /// Stored user record. A record that does not parse counts as no user.
    pub async fn user(&self) -> anyhow::Result<Option<SessionUser>> {
        let Some(raw) = self.inner.store.get(USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<SessionUser>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "stored user record is not valid JSON, ignoring it");
                Ok(None)
            }
        }
    }

    /// Authenticated iff a token is present and the user's role is admin or author.
    pub async fn auth_state(&self) -> anyhow::Result<AuthState> {
        let token = self.token().await?;
        let user = self.user().await?;
        Ok(match (token, user) {
            (Some(_), Some(user)) if user.can_use_console() => AuthState::Authenticated(user),
            _ => AuthState::Unauthenticated,
        })
    }

    pub async fn is_authenticated(&self) -> anyhow::Result<bool> {
        Ok(self.auth_state().await?.is_authenticated())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn login(&self, response: &LoginResponse) -> anyhow::Result<()> {
        let store = &self.inner.store;
        let guard = self.inner.write_lock.lock().await;
        store.set(TOKEN_KEY, &response.token).await?;
        match response.refresh_token.as_deref() {
            Some(refresh) => store.set(REFRESH_TOKEN_KEY, refresh).await?,
            None => store.remove(REFRESH_TOKEN_KEY).await?,
        }
        store
            .set(USER_KEY, &serde_json::to_string(&response.user)?)
            .await?;
        self.mark_seen().await;
        drop(guard);
        tracing::info!(role = ?response.user.role, "signed in");
        self.publish(SessionEvent::SignedIn(response.user.clone()));
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.clear().await?;
        tracing::info!("signed out");
        self.publish(SessionEvent::SignedOut(SignOutReason::Logout));
        Ok(())
    }

    /// Forced sign-out after a 401: clear the keys and leave for the login route.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn handle_unauthorized(&self) -> anyhow::Result<()> {
        self.clear().await?;
        let navigator = &self.inner.navigator;
        if navigator.current_route() != self.inner.login_route {
            navigator.redirect(&self.inner.login_route);
        }
        self.publish(SessionEvent::SignedOut(SignOutReason::Unauthorized));
        Ok(())
    }

    /// Re-evaluate after an outside write to the store and tell subscribers.
    pub async fn storage_changed(&self) -> anyhow::Result<AuthState> {
        let state = self.auth_state().await?;
        tracing::debug!(authenticated = state.is_authenticated(), "session store changed");
        self.publish(SessionEvent::Changed(state.clone()));
        Ok(state)
    }

    /// Poll the store and call [`Session::storage_changed`] when another writer touches it.
    ///
    /// Writes made through this session do not trigger a notification.
    pub async fn watch_store(&self, period: Duration) -> JoinHandle<()> {
        self.mark_seen().await;
        let session = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let changed = {
                    let _guard = session.inner.write_lock.lock().await;
                    match session.inner.store.revision().await {
                        Ok(rev) => session.inner.seen_revision.swap(rev, Ordering::SeqCst) != rev,
                        Err(e) => {
                            tracing::warn!(error = %format!("{:?}", e), "failed to read session store revision");
                            continue;
                        }
                    }
                };
                if changed {
                    if let Err(e) = session.storage_changed().await {
                        tracing::warn!(error = %format!("{:?}", e), "failed to re-evaluate session");
                    }
                }
            }
        })
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let store = &self.inner.store;
        let _guard = self.inner.write_lock.lock().await;
        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            store.remove(key).await?;
        }
        self.mark_seen().await;
        Ok(())
    }

    async fn mark_seen(&self) {
        if let Ok(rev) = self.inner.store.revision().await {
            self.inner.seen_revision.store(rev, Ordering::SeqCst);
        }
    }

    fn publish(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn session_with(values: &[(&str, &str)]) -> Session {
        Session::new(
            Arc::new(MemoryStore::with_values(values.iter().copied())),
            Arc::new(CliNavigator::new("/admin")),
            DEFAULT_LOGIN_ROUTE,
        )
    }

    #[tokio::test]
    async fn viewer_with_token_is_not_authenticated() {
        let s = session_with(&[("token", "abc"), ("user", r#"{"role":"viewer"}"#)]);
        assert!(!s.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn admin_and_author_are_authenticated() {
        for role in ["admin", "author"] {
            let user = format!(r#"{{"role":"{role}","name":"Sam"}}"#);
            let s = session_with(&[("token", "abc"), ("user", user.as_str())]);
            assert!(s.is_authenticated().await.unwrap(), "role {role}");
        }
    }

    #[tokio::test]
    async fn missing_token_or_broken_user_is_unauthenticated() {
        let s = session_with(&[("user", r#"{"role":"admin"}"#)]);
        assert_eq!(s.auth_state().await.unwrap(), AuthState::Unauthenticated);

        let s = session_with(&[("token", "abc"), ("user", "{not json")]);
        assert!(s.user().await.unwrap().is_none());
        assert_eq!(s.auth_state().await.unwrap(), AuthState::Unauthenticated);

        let s = session_with(&[("token", ""), ("user", r#"{"role":"admin"}"#)]);
        assert!(!s.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn login_then_logout_publishes_events() {
        let s = session_with(&[]);
        let mut rx = s.subscribe();
        let response = LoginResponse {
            token: "t1".into(),
            refresh_token: Some("r1".into()),
            user: SessionUser {
                role: Some(Role::Admin),
                ..Default::default()
            },
        };
        s.login(&response).await.unwrap();
        assert!(s.is_authenticated().await.unwrap());
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::SignedIn(_)));

        s.logout().await.unwrap();
        assert!(s.token().await.unwrap().is_none());
        assert!(s.inner.store.get(REFRESH_TOKEN_KEY).await.unwrap().is_none());
        assert!(s.inner.store.get(USER_KEY).await.unwrap().is_none());
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::SignedOut(SignOutReason::Logout)
        );
    }

    #[tokio::test]
    async fn unauthorized_redirects_once() {
        let navigator = Arc::new(CliNavigator::new("/admin/files"));
        let s = Session::new(
            Arc::new(MemoryStore::with_values([("token", "abc"), ("refreshToken", "r")])),
            navigator.clone(),
            DEFAULT_LOGIN_ROUTE,
        );
        s.handle_unauthorized().await.unwrap();
        assert_eq!(navigator.current_route(), "/login");
        assert!(s.token().await.unwrap().is_none());
    }
}

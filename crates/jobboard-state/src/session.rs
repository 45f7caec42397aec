//! Session store: the bearer token, the resolved user and their lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jobboard_client::{ApiClient, ApiError};
use jobboard_models::{UserPatch, UserRecord};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};

/// Current authentication state.
///
/// `user` is only ever set while `token` is set.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserRecord>,
    /// True while a token is being resolved into a user.
    pub loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("loading", &self.loading)
            .finish()
    }
}

/// Sole owner and writer of the session.
///
/// State changes are published through a watch channel. Every token change
/// bumps a generation counter; a resolution that finishes after the token
/// moved on is discarded.
pub struct SessionStore {
    client: Arc<ApiClient>,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new(client: Arc<ApiClient>, storage: Arc<dyn SessionStorage>) -> Arc<Self> {
        let (state, _) = watch::channel(Session::default());
        Arc::new(Self {
            client,
            storage,
            state,
            generation: AtomicU64::new(0),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Bearer token for authenticated calls.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Resume the persisted session, if any.
    ///
    /// The remembered user is shown provisionally while the token is
    /// resolved. Always ends with `loading == false`.
    pub async fn initialize(&self) {
        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("Failed to read persisted token: {}", e);
                None
            }
        };

        let Some(token) = token else {
            self.next_generation();
            self.state.send_modify(|s| *s = Session::default());
            debug!("No persisted session");
            return;
        };

        let remembered = self.remembered_user();
        let generation = self.next_generation();
        self.state.send_modify(|s| {
            s.token = Some(token.clone());
            s.user = remembered;
            s.loading = true;
        });

        info!("Resuming persisted session");
        self.resolve(generation, token).await;
    }

    /// Adopt a new token and resolve its user in the background.
    ///
    /// The token is persisted and published immediately. The previous user
    /// stays visible until the resolution finishes. Must be called inside
    /// a tokio runtime.
    pub fn set_token(self: &Arc<Self>, token: impl Into<String>) -> JoinHandle<()> {
        let token = token.into();
        let generation = self.next_generation();
        self.state.send_modify(|s| {
            if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
                warn!("Failed to persist token: {}", e);
            }
            s.token = Some(token.clone());
            s.loading = true;
        });

        let this = Arc::clone(self);
        tokio::spawn(async move { this.resolve(generation, token).await })
    }

    /// Re-resolve the user for the current token.
    pub async fn refresh(&self) {
        let Some(token) = self.token() else {
            return;
        };
        let generation = self.next_generation();
        self.state.send_modify(|s| s.loading = true);
        self.resolve(generation, token).await;
    }

    /// Drop the session from memory and durable storage.
    pub fn clear(&self) {
        self.next_generation();
        self.state.send_modify(|s| {
            self.forget_persisted();
            *s = Session::default();
        });
        info!("Session cleared");
    }

    /// Merge a partial record into the current user. Returns false when
    /// nobody is signed in.
    pub fn update_user(&self, patch: &UserPatch) -> bool {
        self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(user) => {
                user.apply(patch);
                self.remember_user(user);
                true
            }
            None => false,
        })
    }

    /// Wait until no resolution is in flight and return the settled state.
    pub async fn wait_until_resolved(&self) -> Session {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| !s.loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn resolve(&self, generation: u64, token: String) {
        let result = self.client.current_user(&token).await;

        let applied = self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &result {
                Ok(user) => {
                    self.remember_user(user);
                    s.user = Some(user.clone());
                }
                Err(e) if rejects_token(e) => {
                    self.forget_persisted();
                    *s = Session::default();
                }
                Err(_) => {
                    *s = Session::default();
                }
            }
            true
        });

        if !applied {
            debug!(generation, "Discarding stale session resolution");
            return;
        }
        match result {
            Ok(user) => info!(user_id = user.user_id, "Session resolved"),
            Err(e) if rejects_token(&e) => warn!("Stored token rejected: {}", e),
            Err(e) => warn!("Session resolution failed, keeping stored token: {}", e),
        }
    }

    fn remembered_user(&self) -> Option<UserRecord> {
        let raw = self.storage.get(USER_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("Ignoring unreadable user snapshot: {}", e);
                None
            }
        }
    }

    fn remember_user(&self, user: &UserRecord) {
        let result = serde_json::to_string(user)
            .map_err(|e| e.to_string())
            .and_then(|json| self.storage.set(USER_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to persist user snapshot: {}", e);
        }
    }

    fn forget_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, "Failed to remove persisted session entry: {}", e);
            }
        }
    }
}

/// The server says the token itself is no good.
fn rejects_token(err: &ApiError) -> bool {
    matches!(err, ApiError::Auth(_) | ApiError::NotFound(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use jobboard_client::{ClientConfig, RetryConfig};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer, storage: Arc<MemoryStorage>) -> Arc<SessionStore> {
        let mut config = ClientConfig::with_base_url(server.uri());
        config.retry = RetryConfig::disabled();
        SessionStore::new(Arc::new(ApiClient::new(config).unwrap()), storage)
    }

    fn user_body(id: i64) -> serde_json::Value {
        json!({ "userId": id, "name": "Asha", "email": "asha@example.com", "userType": "JOBSEEKER", "isVerified": true })
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_logged_out() {
        let server = MockServer::start().await;
        let session = store(&server, Arc::new(MemoryStorage::new()));
        session.initialize().await;
        assert_eq!(session.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn test_initialize_resumes_persisted_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer persisted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_body(5)))
            .expect(1)
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "persisted").unwrap();
        let session = store(&server, storage.clone());
        session.initialize().await;

        let state = session.snapshot();
        assert!(!state.loading);
        assert_eq!(state.token.as_deref(), Some("persisted"));
        assert_eq!(state.user.map(|u| u.user_id), Some(5));
        assert!(storage.get(USER_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_token_clears_storage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "old").unwrap();
        let session = store(&server, storage.clone());
        session.initialize().await;

        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_persisted_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "still-good").unwrap();
        let session = store(&server, storage.clone());
        session.initialize().await;

        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("still-good"));
    }

    #[tokio::test]
    async fn test_set_token_keeps_previous_user_until_resolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer first"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_body(1)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer second"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(user_body(2))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .mount(&server)
            .await;

        let session = store(&server, Arc::new(MemoryStorage::new()));
        session.set_token("first").await.unwrap();
        assert_eq!(session.user().map(|u| u.user_id), Some(1));

        let handle = session.set_token("second");
        let pending = session.snapshot();
        assert!(pending.loading);
        assert_eq!(pending.token.as_deref(), Some("second"));
        assert_eq!(pending.user.map(|u| u.user_id), Some(1));

        handle.await.unwrap();
        assert_eq!(session.user().map(|u| u.user_id), Some(2));
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded_after_clear() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(user_body(3))
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStorage::new());
        let session = store(&server, storage.clone());
        let handle = session.set_token("tok");
        session.clear();
        handle.await.unwrap();

        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_user_merges_patch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_body(4)))
            .mount(&server)
            .await;

        let session = store(&server, Arc::new(MemoryStorage::new()));
        assert!(!session.update_user(&UserPatch::verified_phone("9876543210")));

        session.set_token("tok").await.unwrap();
        assert!(session.update_user(&UserPatch::verified_phone("9876543210")));
        let user = session.user().unwrap();
        assert_eq!(user.phone.as_deref(), Some("9876543210"));
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session {
            token: Some("secret-token".into()),
            user: None,
            loading: false,
        };
        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}

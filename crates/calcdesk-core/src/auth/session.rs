use std::sync::Arc;

use tracing::{info, warn};

use super::store::{KeyValueStore, StoreError};
use crate::models::TokenResponse;

/// Store key holding the bearer token.
pub const TOKEN_KEY: &str = "access_token";

/// Store keys written alongside the token at login.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USERNAME_KEY: &str = "username";
pub const USER_ID_KEY: &str = "user_id";

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";

/// Moves the user to another view of the application.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Bearer-token session over a persistent store.
///
/// The session holds no token of its own: every read goes to the store, so
/// a login or logout through another handle on the same store is visible
/// immediately.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// The stored bearer token, if any. A store read failure counts as no token.
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    /// Whether a token is present. Does not check the token's shape or expiry.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Page-load guard: redirect to the login view when there is no token.
    pub fn require_auth(&self) -> bool {
        if self.is_authenticated() {
            true
        } else {
            self.navigator.redirect(LOGIN_PATH);
            false
        }
    }

    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_KEY)
    }

    pub fn user_id(&self) -> Option<String> {
        self.read(USER_ID_KEY)
    }

    /// Persist the token and profile keys from a successful login.
    pub fn store_login(&self, login: &TokenResponse) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, &login.access_token)?;
        match &login.refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.store.remove(REFRESH_TOKEN_KEY)?,
        }
        self.store.set(USERNAME_KEY, &login.username)?;
        self.store.set(USER_ID_KEY, &login.user_id)?;
        info!(username = %login.username, "Session stored");
        Ok(())
    }

    /// Drop the session and everything else in the store scope.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("Session cleared");
        Ok(())
    }

    /// Handle a server-side authorization failure: wipe the store and send
    /// the user back to the login view.
    pub fn expire(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session store after expiry");
        }
        self.navigator.redirect(LOGIN_PATH);
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read session store");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::auth::MemoryStore;

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, path: &str) {
            self.visits.lock().expect("navigator lock").push(path.to_string());
        }
    }

    fn login_response() -> TokenResponse {
        serde_json::from_str(
            r#"{"access_token": "tok", "refresh_token": "ref", "user_id": "u-1", "username": "jdoe"}"#,
        )
        .expect("Failed to parse login JSON")
    }

    #[test]
    fn test_require_auth_redirects_without_token() {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let session = Session::new(store, nav.clone());

        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
        assert!(!session.require_auth());
        assert_eq!(*nav.visits.lock().expect("lock"), vec![LOGIN_PATH.to_string()]);
    }

    #[test]
    fn test_store_login_and_logout() {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let session = Session::new(store.clone(), nav.clone());

        session.store_login(&login_response()).expect("store login");
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.username().as_deref(), Some("jdoe"));
        assert_eq!(session.user_id().as_deref(), Some("u-1"));
        assert!(session.require_auth());
        assert!(nav.visits.lock().expect("lock").is_empty());

        // Unrelated keys in the same scope go too
        store.set("theme", "dark").expect("set");
        session.logout().expect("logout");
        assert!(store.is_empty());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_expire_clears_store_and_redirects() {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let session = Session::new(store.clone(), nav.clone());
        session.store_login(&login_response()).expect("store login");

        session.expire();

        assert!(store.is_empty());
        assert_eq!(*nav.visits.lock().expect("lock"), vec![LOGIN_PATH.to_string()]);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiRequest, RequestBody, Transport};
use crate::models::user::LoginResponse;
use crate::models::Identity;

use super::TokenStore;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const PROFILE_PATH: &str = "/api/auth/me";

/// Shown when the backend gives no reason for a failed login ("login failed")
pub const DEFAULT_LOGIN_ERROR: &str = "ការចូលប្រើប្រាស់បរាជ័យ";

/// Snapshot of who is logged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub identity: Option<Identity>,
    pub authenticated: bool,
    pub initializing: bool,
}

impl Session {
    fn starting() -> Self {
        Self {
            token: None,
            identity: None,
            authenticated: false,
            initializing: true,
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.identity = None;
        self.authenticated = false;
    }
}

/// What a protected screen should do given the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Startup validation has not finished yet
    Pending,
    Granted,
    RedirectToLogin,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct LoginFailure {
    pub message: String,
}

impl LoginFailure {
    /// Message from the backend's `detail` field, or the generic one
    fn from_body(body: &str) -> Self {
        let message = ApiError::detail_from_body(body)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string());
        Self { message }
    }

    fn generic() -> Self {
        Self {
            message: DEFAULT_LOGIN_ERROR.to_string(),
        }
    }
}

struct Inner {
    state: RwLock<Session>,
    /// Set by the first `initialize`; later calls return immediately
    started: AtomicBool,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
}

/// Owner of the session and the persisted credential.
///
/// Construct one per process and hand clones to whatever needs it; clones
/// share the same session. State changes only through [`initialize`],
/// [`login`] and [`logout`].
///
/// [`initialize`]: SessionManager::initialize
/// [`login`]: SessionManager::login
/// [`logout`]: SessionManager::logout
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

/// Flips `initializing` off when dropped, so every exit from
/// `initialize` (including a dropped future) finalizes startup.
struct FinishInit<'a>(&'a RwLock<Session>);

impl Drop for FinishInit<'_> {
    fn drop(&mut self) {
        self.0.write().initializing = false;
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(Session::starting()),
                started: AtomicBool::new(false),
                store,
                transport,
            }),
        }
    }

    /// Validate any persisted credential against the backend.
    ///
    /// Best-effort: a rejected token, an unreachable server or an unreadable
    /// token record all end in a clean logged-out state and are only logged.
    /// Nothing is returned to the caller. Runs at most once per manager.
    pub async fn initialize(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!("Session already initialized");
            return;
        }
        let _finish = FinishInit(&self.inner.state);

        let token = match self.inner.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted token, starting logged out");
                self.inner.state.write().reset();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token, starting logged out");
                self.discard_persisted();
                self.inner.state.write().reset();
                return;
            }
        };

        match self.fetch_identity(&token).await {
            Ok(identity) => {
                info!(user = identity.display_name(), "Session restored");
                let mut state = self.inner.state.write();
                state.token = Some(token);
                state.identity = Some(identity);
                state.authenticated = true;
            }
            Err(e) => {
                warn!(error = %e, "Persisted token rejected, starting logged out");
                self.discard_persisted();
                self.inner.state.write().reset();
            }
        }
    }

    async fn fetch_identity(&self, token: &str) -> Result<Identity, ApiError> {
        let request =
            ApiRequest::new(Method::GET, PROFILE_PATH).bearer(Some(token.to_string()));
        let response = self.inner.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        response.json()
    }

    /// Exchange a username and password for a session.
    ///
    /// The credentials go out form-encoded, as the backend requires. On
    /// failure nothing is persisted and the session is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, LoginFailure> {
        let request = ApiRequest::new(Method::POST, LOGIN_PATH).body(RequestBody::Form(vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]));

        let response = match self.inner.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, username, "Login request failed");
                return Err(LoginFailure::generic());
            }
        };
        if !response.is_success() {
            let err = ApiError::from_status(response.status, &response.body);
            warn!(error = %err, username, "Login rejected");
            return Err(LoginFailure::from_body(&response.body));
        }
        let login: LoginResponse = match response.json() {
            Ok(login) => login,
            Err(e) => {
                warn!(error = %e, "Login response missing token");
                return Err(LoginFailure::generic());
            }
        };

        if let Err(e) = self.inner.store.save(&login.access_token) {
            warn!(error = %e, "Failed to persist token, ending session");
            // The record is in an unknown state; memory must not outlive it
            self.logout();
            return Err(LoginFailure::generic());
        }

        let identity = Identity::new(login.identity);
        {
            let mut state = self.inner.state.write();
            state.token = Some(login.access_token);
            state.identity = Some(identity.clone());
            state.authenticated = true;
        }
        info!(user = identity.display_name(), "Login successful");
        Ok(identity)
    }

    /// Forget the session and the persisted token. Safe to call repeatedly.
    pub fn logout(&self) {
        self.inner.state.write().reset();
        self.discard_persisted();
        debug!("Logged out");
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to remove persisted token");
        }
    }

    /// Bearer token for outgoing requests, if logged in
    pub fn token(&self) -> Option<String> {
        self.inner.state.read().token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.read().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().authenticated
    }

    pub fn is_initializing(&self) -> bool {
        self.inner.state.read().initializing
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn route_access(&self) -> RouteAccess {
        let state = self.inner.state.read();
        if state.initializing {
            RouteAccess::Pending
        } else if state.authenticated {
            RouteAccess::Granted
        } else {
            RouteAccess::RedirectToLogin
        }
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }
}

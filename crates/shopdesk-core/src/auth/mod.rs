//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionManager`: the single owner of login state (initialize, login, logout)
//! - `TokenStore`: where the credential token survives restarts (file, keyring, memory)
//!
//! Only the token is persisted; identity is re-fetched from the backend on startup.

pub mod session;
pub mod store;

pub use session::{
    LoginFailure, RouteAccess, Session, SessionManager, DEFAULT_LOGIN_ERROR, LOGIN_PATH,
    PROFILE_PATH,
};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};

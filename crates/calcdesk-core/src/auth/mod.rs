//! Authentication module for the client session.
//!
//! This module provides:
//! - `Session`: bearer-token session read from a `KeyValueStore`
//! - `KeyValueStore`: the storage seam, with `FileStore` and `MemoryStore`
//! - `Navigator`: how the session sends users to the login view
//! - `CredentialStore`: optional remembered passwords via the OS keychain
//!
//! Tokens carry no client-side expiry; the server's 401 ends a session.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{Navigator, Session, LOGIN_PATH, TOKEN_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

//! Client-side core for the calcdesk calculator service.
//!
//! This crate provides:
//! - `auth`: bearer-token session over a pluggable key-value store
//! - `api`: the authenticated request wrapper and typed service calls
//! - `notify`: success/error alerts with cancellable auto-hide
//! - `validate`: form field and calculation input checks
//! - `format`: date/time and text display helpers
//!
//! Everything a front end needs is re-exported at the crate root.

pub mod api;
pub mod auth;
pub mod config;
pub mod format;
pub mod models;
pub mod notify;
pub mod validate;

pub use api::{ApiClient, ApiError, FetchOptions, HttpResponse, ReqwestTransport, Transport};
pub use auth::{
    CredentialStore, FileStore, KeyValueStore, MemoryStore, Navigator, Session, StoreError,
    LOGIN_PATH, TOKEN_KEY,
};
pub use config::{ClockStyle, Config};
pub use format::{
    capitalize_first, format_date, format_date_time, format_date_time_with, format_number,
    format_time, format_time_with, truncate, FormatError,
};
pub use models::{Calculation, CalculationType};
pub use notify::{AlertKind, AlertSink, Notifier};
pub use validate::{
    parse_number_inputs, validate_calculation_inputs, validate_email, validate_password,
    validate_username, ValidationError,
};

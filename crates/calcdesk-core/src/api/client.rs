//! API client for the calculator service.
//!
//! `ApiClient::authenticated_fetch` is the single path for requests that need
//! the session token; the typed methods below build on it and add client-side
//! validation and status classification.

use std::sync::Arc;

use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::models::{
    Calculation, CalculationType, CalculationUpdate, HealthStatus, HistoryPage, LoginRequest,
    NewCalculation, OperationStatistics, RegisterRequest, TokenResponse, UserResponse,
    UserStatistics,
};
use crate::validate::{validate_calculation_inputs, validate_page_request};

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-request method, extra headers and body for `authenticated_fetch`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl FetchOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Add a header. Headers given here replace the defaults of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(encoded);
        Ok(self)
    }
}

/// Overlay caller headers on the defaults; a caller header replaces any
/// default with the same (case-insensitive) name.
fn merge_headers(
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .into_iter()
        .filter(|(name, _)| !overrides.iter().any(|(o, _)| o.eq_ignore_ascii_case(name)))
        .collect();
    merged.extend(overrides);
    merged
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Session,
    base_url: String,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Session, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            session,
            base_url,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; paths are joined to the base URL.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Validate that a calculation id looks like a UUID.
    /// 36 characters with dashes: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    fn is_valid_id(s: &str) -> bool {
        if s.len() != 36 {
            return false;
        }
        s.chars().enumerate().all(|(i, c)| {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                c == '-'
            } else {
                c.is_ascii_hexdigit()
            }
        })
    }

    fn calculation_path(id: &str) -> Result<String, ApiError> {
        if !Self::is_valid_id(id) {
            return Err(ApiError::BadRequest("Invalid calculation id format.".to_string()));
        }
        Ok(format!("/calculations/{}", id))
    }

    /// Send a request carrying the session's bearer token.
    ///
    /// Fails with `Unauthenticated` before touching the network when there is
    /// no token. A 401 ends the session: the store is cleared, the user is
    /// sent to the login view and the call fails with `SessionExpired`. Any
    /// other status is returned as-is.
    pub async fn authenticated_fetch(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<HttpResponse, ApiError> {
        let token = self.session.token().ok_or(ApiError::Unauthenticated)?;

        let defaults = vec![
            (header::AUTHORIZATION.as_str().to_string(), format!("Bearer {}", token)),
            (header::CONTENT_TYPE.as_str().to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        let request = HttpRequest {
            method: options.method,
            url: self.url(url),
            headers: merge_headers(defaults, options.headers),
            body: options.body,
        };

        debug!(method = %request.method, url = %request.url, "Authenticated request");
        let response = self.transport.send(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url, "Server rejected session token");
            self.session.expire();
            return Err(ApiError::SessionExpired);
        }

        Ok(response)
    }

    /// Send a request without credentials (login, registration, health).
    async fn public_fetch(&self, path: &str, options: FetchOptions) -> Result<HttpResponse, ApiError> {
        let defaults = vec![(header::CONTENT_TYPE.as_str().to_string(), JSON_CONTENT_TYPE.to_string())];
        let request = HttpRequest {
            method: options.method,
            url: self.url(path),
            headers: merge_headers(defaults, options.headers),
            body: options.body,
        };

        debug!(method = %request.method, url = %request.url, "Public request");
        self.transport.send(request).await
    }

    /// Check if response is successful, returning an error with body if not.
    fn check_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status(), response.text()))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.authenticated_fetch(path, FetchOptions::default()).await?;
        Self::check_response(response)?.json()
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let options = FetchOptions::new(method).json(body)?;
        let response = self.authenticated_fetch(path, options).await?;
        Self::check_response(response)?.json()
    }

    // ===== Auth =====

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserResponse, ApiError> {
        crate::validate::validate_registration(
            &request.email,
            &request.username,
            &request.password,
            &request.confirm_password,
        )?;

        let options = FetchOptions::new(Method::POST).json(request)?;
        let response = self.public_fetch("/auth/register", options).await?;
        let user: UserResponse = Self::check_response(response)?.json()?;
        info!(username = %user.username, "Registered account");
        Ok(user)
    }

    /// Log in and store the returned token in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let options = FetchOptions::new(Method::POST).json(&body)?;
        let response = self.public_fetch("/auth/login", options).await?;
        let token: TokenResponse = Self::check_response(response)?.json()?;

        self.session.store_login(&token)?;
        info!(username = %token.username, "Logged in");
        Ok(token)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.logout()?;
        Ok(())
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.public_fetch("/health", FetchOptions::default()).await?;
        Self::check_response(response)?.json()
    }

    // ===== Calculations =====

    pub async fn create_calculation(
        &self,
        kind: CalculationType,
        inputs: Vec<f64>,
    ) -> Result<Calculation, ApiError> {
        validate_calculation_inputs(&inputs, kind)?;
        let body = NewCalculation { kind, inputs };
        self.send_json(Method::POST, "/calculations", &body).await
    }

    /// All of the user's calculations, newest first.
    pub async fn list_calculations(&self) -> Result<Vec<Calculation>, ApiError> {
        self.get("/calculations").await
    }

    pub async fn get_calculation(&self, id: &str) -> Result<Calculation, ApiError> {
        let path = Self::calculation_path(id)?;
        self.get(&path).await
    }

    /// Change the type and/or inputs of a calculation; the server recomputes
    /// the result.
    pub async fn update_calculation(
        &self,
        id: &str,
        update: &CalculationUpdate,
    ) -> Result<Calculation, ApiError> {
        let path = Self::calculation_path(id)?;
        if let Some(inputs) = &update.inputs {
            // Without a new type the stored type is unknown here, so only the
            // length rule can be checked
            validate_calculation_inputs(inputs, update.kind.unwrap_or(CalculationType::Addition))?;
        }
        self.send_json(Method::PUT, &path, update).await
    }

    pub async fn delete_calculation(&self, id: &str) -> Result<(), ApiError> {
        let path = Self::calculation_path(id)?;
        let response = self
            .authenticated_fetch(&path, FetchOptions::new(Method::DELETE))
            .await?;
        Self::check_response(response)?;
        Ok(())
    }

    // ===== Reports =====

    pub async fn statistics(&self) -> Result<UserStatistics, ApiError> {
        self.get("/api/statistics").await
    }

    pub async fn history(
        &self,
        page: u32,
        page_size: u32,
        operation: Option<CalculationType>,
    ) -> Result<HistoryPage, ApiError> {
        validate_page_request(page, page_size)?;

        let mut path = format!("/api/history?page={}&page_size={}", page, page_size);
        if let Some(op) = operation {
            path.push_str("&operation=");
            path.push_str(op.as_str());
        }
        self.get(&path).await
    }

    pub async fn operation_statistics(
        &self,
        operation: CalculationType,
    ) -> Result<OperationStatistics, ApiError> {
        self.get(&format!("/api/statistics/operation/{}", operation)).await
    }
}

use crate::constants::{envelope, limits, login, network};
use crate::errors::SettingsError;
use crate::services::credential_store::CredentialStore;
use crate::services::logger::Logger;
use crate::services::operation::{OperationDescriptor, Outcome};
use crate::services::settings::Settings;
use crate::utils::text::preview_body;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Wraps one call with the session rules: refuse protected calls when no
/// token is held, and drop the token the platform just rejected.
pub async fn with_auth_check<'a, F, Fut>(
    store: &CredentialStore,
    operation: &'a OperationDescriptor,
    requires_auth: bool,
    next: F,
) -> Outcome
where
    F: FnOnce(&'a OperationDescriptor, Option<String>) -> Fut,
    Fut: Future<Output = Outcome>,
{
    let token = store.token();
    if requires_auth && token.is_none() {
        return Outcome::AuthRequired;
    }
    let outcome = next(operation, token.clone()).await;
    if outcome == Outcome::AuthRequired {
        if let Some(stale) = token {
            store.invalidate(&stale);
        }
    }
    outcome
}

enum BusinessStatus {
    Accepted,
    Rejected(i64, String),
}

fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn envelope_message(value: &Value) -> Option<String> {
    ["msg", "message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Reads the platform's application-level indicator. An explicit `success`
/// flag wins over `code`; a body with neither is taken as accepted.
fn business_status(value: &Value) -> BusinessStatus {
    let code = value.get("code").and_then(value_as_i64);
    let accepted = match value.get("success").and_then(|v| v.as_bool()) {
        Some(flag) => flag,
        None => code
            .map(|c| envelope::SUCCESS_CODES.contains(&c))
            .unwrap_or(true),
    };
    if accepted {
        return BusinessStatus::Accepted;
    }
    let message = envelope_message(value).unwrap_or_else(|| "request rejected".to_string());
    BusinessStatus::Rejected(code.unwrap_or(0), message)
}

fn envelope_payload(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn failure_message(status: u16, body: &str, parsed: Option<&Value>) -> String {
    if let Some(message) = parsed.and_then(envelope_message) {
        return message;
    }
    if !body.trim().is_empty() {
        return preview_body(body, limits::ERROR_BODY_PREVIEW_BYTES);
    }
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Maps a raw platform reply onto an [`Outcome`].
pub fn classify_response(status: u16, body: &str, auth_failure_codes: &[i64]) -> Outcome {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if status == 401 || status == 403 {
        return Outcome::AuthRequired;
    }
    if !(200..300).contains(&status) {
        return Outcome::RemoteError(
            i64::from(status),
            failure_message(status, body, parsed.as_ref()),
        );
    }
    let Some(value) = parsed else {
        return Outcome::transport(format!(
            "Malformed response from platform: {}",
            preview_body(body, limits::ERROR_BODY_PREVIEW_BYTES)
        ));
    };
    match business_status(&value) {
        BusinessStatus::Accepted => Outcome::Success(envelope_payload(value)),
        BusinessStatus::Rejected(code, _) if auth_failure_codes.contains(&code) => {
            Outcome::AuthRequired
        }
        BusinessStatus::Rejected(code, message) => Outcome::RemoteError(code, message),
    }
}

fn extract_login_token(value: &Value, headers: &HeaderMap) -> Option<String> {
    let data = value.get("data");
    ["token", "access_token", "accessToken"]
        .iter()
        .filter_map(|key| data.and_then(|d| d.get(*key)).and_then(|v| v.as_str()))
        .chain(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn transport_outcome(err: reqwest::Error) -> Outcome {
    if err.is_timeout() {
        Outcome::timeout(format!("Platform request timed out: {}", err))
    } else if err.is_connect() {
        Outcome::transport(format!("Could not connect to platform: {}", err))
    } else {
        Outcome::transport(format!("Platform request failed: {}", err))
    }
}

struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

/// Executes platform operations on behalf of the shared session.
#[derive(Clone)]
pub struct SimClient {
    logger: Logger,
    client: Client,
    store: Arc<CredentialStore>,
    base_url: String,
    login_timeout: Duration,
    machine_code: String,
    client_category: String,
    auth_scheme: Option<String>,
    auth_failure_codes: Vec<i64>,
}

impl SimClient {
    pub fn new(
        logger: Logger,
        settings: &Settings,
        store: Arc<CredentialStore>,
    ) -> Result<Self, SettingsError> {
        let client = Client::builder()
            .user_agent(network::USER_AGENT)
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self {
            logger: logger.child("client"),
            client,
            store,
            base_url: settings.base_url.clone(),
            login_timeout: settings.login_timeout,
            machine_code: settings.machine_code.clone(),
            client_category: settings.client_category.clone(),
            auth_scheme: settings.auth_scheme.clone(),
            auth_failure_codes: settings.auth_failure_codes.clone(),
        })
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    fn build_headers(&self, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            match self.authorization_value(token) {
                Some(header) => {
                    headers.insert(AUTHORIZATION, header);
                }
                None => self
                    .logger
                    .warn("session token is not a valid header value; sent without it", None),
            }
        }
        headers
    }

    fn authorization_value(&self, token: &str) -> Option<HeaderValue> {
        let value = match &self.auth_scheme {
            Some(scheme) => format!("{} {}", scheme, token),
            None => token.to_string(),
        };
        let mut header = HeaderValue::from_str(&value).ok()?;
        header.set_sensitive(true);
        Some(header)
    }

    async fn dispatch(
        &self,
        operation: &OperationDescriptor,
        token: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, Outcome> {
        let url = format!("{}{}", self.base_url, operation.path);
        let mut request = self
            .client
            .request(operation.method.clone(), &url)
            .headers(self.build_headers(token));
        if !operation.query.is_empty() {
            request = request.query(&operation.query);
        }
        if let Some(body) = &operation.body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(transport_outcome)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(transport_outcome)?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    async fn send(&self, operation: &OperationDescriptor, token: Option<String>) -> Outcome {
        match self.dispatch(operation, token.as_deref(), None).await {
            Ok(raw) => classify_response(raw.status, &raw.body, &self.auth_failure_codes),
            Err(outcome) => outcome,
        }
    }

    /// Runs one operation. Never fails past this boundary: every error path
    /// is an [`Outcome`] variant.
    pub async fn execute(&self, operation: &OperationDescriptor, requires_auth: bool) -> Outcome {
        let meta = serde_json::json!({
            "method": operation.method.as_str(),
            "path": operation.path,
        });
        self.logger.debug("execute", Some(&meta));

        let outcome = with_auth_check(&self.store, operation, requires_auth, |op, token| {
            self.send(op, token)
        })
        .await;

        self.logger.debug(
            "execute finished",
            Some(&serde_json::json!({
                "path": operation.path,
                "outcome": outcome.label(),
            })),
        );
        match &outcome {
            Outcome::Success(_) => {}
            Outcome::AuthRequired => self.logger.warn(
                "platform session missing or rejected; login required",
                Some(&meta),
            ),
            Outcome::TransportError { message, .. } => self.logger.warn(message, Some(&meta)),
            Outcome::RemoteError(code, message) => self.logger.info(
                "platform rejected operation",
                Some(&serde_json::json!({
                    "method": operation.method.as_str(),
                    "path": operation.path,
                    "code": code,
                    "message": message,
                })),
            ),
        }
        outcome
    }

    /// Authenticates against the identity endpoint. Only a successful login
    /// touches the store; the password is never retained.
    pub async fn login(&self, username: &str, password: &str) -> Outcome {
        let operation = OperationDescriptor::post(login::PATH).with_body(serde_json::json!({
            "username": username,
            "password": password,
            "computerMachineCode": self.machine_code,
            "clientCategory": self.client_category,
        }));

        let raw = match self
            .dispatch(&operation, None, Some(self.login_timeout))
            .await
        {
            Ok(raw) => raw,
            Err(outcome) => {
                self.logger.warn("login request failed", None);
                return outcome;
            }
        };

        let parsed: Option<Value> = serde_json::from_str(&raw.body).ok();
        if !(200..300).contains(&raw.status) {
            let message = failure_message(raw.status, &raw.body, parsed.as_ref());
            self.logger.info(
                "login rejected",
                Some(&serde_json::json!({ "status": raw.status, "message": message })),
            );
            return Outcome::RemoteError(i64::from(raw.status), message);
        }
        let Some(value) = parsed else {
            return Outcome::transport(format!(
                "Malformed login response: {}",
                preview_body(&raw.body, limits::ERROR_BODY_PREVIEW_BYTES)
            ));
        };
        if let BusinessStatus::Rejected(code, message) = business_status(&value) {
            self.logger.info(
                "login rejected",
                Some(&serde_json::json!({ "code": code, "message": message })),
            );
            return Outcome::RemoteError(code, message);
        }
        let Some(token) = extract_login_token(&value, &raw.headers) else {
            let code = value.get("code").and_then(value_as_i64).unwrap_or(0);
            return Outcome::RemoteError(
                code,
                "Login response did not include a session token".to_string(),
            );
        };

        if self.authorization_value(&token).is_none() {
            self.logger.warn("login token is not a valid header value; session not stored", None);
            return Outcome::RemoteError(
                0,
                "Login response carried a token that cannot be sent as an Authorization header"
                    .to_string(),
            );
        }

        self.store.set_session(token, username);
        let issued_at = self
            .store
            .session()
            .map(|s| s.issued_at.to_rfc3339())
            .unwrap_or_default();
        self.logger.info(
            "login succeeded",
            Some(&serde_json::json!({ "identity": username })),
        );
        Outcome::Success(serde_json::json!({
            "message": "Login successful. Token stored.",
            "identity": username,
            "issued_at": issued_at,
        }))
    }

    /// Drops the current session locally. Returns the identity that was
    /// logged in, if any.
    pub fn logout(&self) -> Option<String> {
        let removed = self.store.take().map(|session| session.identity);
        if let Some(identity) = &removed {
            self.logger.info(
                "session cleared",
                Some(&serde_json::json!({ "identity": identity })),
            );
        }
        removed
    }
}

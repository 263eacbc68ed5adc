use crate::constants::{envelope, login, network};
use crate::errors::SettingsError;
use crate::services::logger::LogLevel;
use std::time::Duration;
use url::Url;

const KEY_BASE_URL: &str = "SIM_BASE_URL";
const KEY_TIMEOUT_MS: &str = "SIM_TIMEOUT_MS";
const KEY_CONNECT_TIMEOUT_MS: &str = "SIM_CONNECT_TIMEOUT_MS";
const KEY_LOGIN_TIMEOUT_MS: &str = "SIM_LOGIN_TIMEOUT_MS";
const KEY_MACHINE_CODE: &str = "SIM_MACHINE_CODE";
const KEY_CLIENT_CATEGORY: &str = "SIM_CLIENT_CATEGORY";
const KEY_AUTH_SCHEME: &str = "SIM_AUTH_SCHEME";
const KEY_AUTH_FAILURE_CODES: &str = "SIM_AUTH_FAILURE_CODES";
const KEY_LOG_LEVEL: &str = "SIM_LOG_LEVEL";

/// Runtime configuration for the platform connection.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub login_timeout: Duration,
    pub machine_code: String,
    pub client_category: String,
    /// Prefix for the `Authorization` header value. `None` sends the raw token.
    pub auth_scheme: Option<String>,
    pub auth_failure_codes: Vec<i64>,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: network::DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            connect_timeout: Duration::from_millis(network::TIMEOUT_CONNECTION_MS),
            login_timeout: Duration::from_millis(network::TIMEOUT_LOGIN_MS),
            machine_code: login::DEFAULT_MACHINE_CODE.to_string(),
            client_category: login::DEFAULT_CLIENT_CATEGORY.to_string(),
            auth_scheme: None,
            auth_failure_codes: envelope::DEFAULT_AUTH_FAILURE_CODES.to_vec(),
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        if let Some(raw) = get(KEY_BASE_URL) {
            settings.base_url = normalize_base_url(KEY_BASE_URL, &raw)?;
        }
        if let Some(raw) = get(KEY_TIMEOUT_MS) {
            settings.request_timeout = parse_millis(KEY_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(KEY_CONNECT_TIMEOUT_MS) {
            settings.connect_timeout = parse_millis(KEY_CONNECT_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(KEY_LOGIN_TIMEOUT_MS) {
            settings.login_timeout = parse_millis(KEY_LOGIN_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(KEY_MACHINE_CODE) {
            settings.machine_code = raw;
        }
        if let Some(raw) = get(KEY_CLIENT_CATEGORY) {
            settings.client_category = raw;
        }
        settings.auth_scheme = get(KEY_AUTH_SCHEME);
        if let Some(raw) = get(KEY_AUTH_FAILURE_CODES) {
            settings.auth_failure_codes = parse_code_list(KEY_AUTH_FAILURE_CODES, &raw)?;
        }
        if let Some(raw) = get(KEY_LOG_LEVEL) {
            settings.log_level = raw
                .parse()
                .map_err(|_| SettingsError::InvalidLogLevel {
                    key: KEY_LOG_LEVEL,
                    value: raw.clone(),
                })?;
        }
        Ok(settings)
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self, SettingsError> {
        self.base_url = normalize_base_url("--base-url", raw)?;
        Ok(self)
    }

    pub fn with_request_timeout_ms(mut self, millis: u64) -> Result<Self, SettingsError> {
        if millis == 0 {
            return Err(SettingsError::InvalidNumber {
                key: "--timeout-ms",
                value: millis.to_string(),
            });
        }
        self.request_timeout = Duration::from_millis(millis);
        Ok(self)
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

fn normalize_base_url(key: &'static str, raw: &str) -> Result<String, SettingsError> {
    let mut url = Url::parse(raw.trim()).map_err(|_| SettingsError::InvalidBaseUrl {
        key,
        value: raw.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SettingsError::UnsupportedScheme {
            key,
            scheme: url.scheme().to_string(),
        });
    }
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, SettingsError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(Duration::from_millis(value)),
        _ => Err(SettingsError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_code_list(key: &'static str, raw: &str) -> Result<Vec<i64>, SettingsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| SettingsError::InvalidCodeList {
            key,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup(&[])).expect("settings");
        assert_eq!(settings.base_url, network::DEFAULT_BASE_URL);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.login_timeout, Duration::from_secs(10));
        assert_eq!(settings.machine_code, "mcp-server-001");
        assert_eq!(settings.client_category, "WEB");
        assert_eq!(settings.auth_scheme, None);
        assert_eq!(settings.auth_failure_codes, vec![401, 403]);
    }

    #[test]
    fn base_url_is_normalized() {
        let settings = Settings::from_lookup(lookup(&[(
            "SIM_BASE_URL",
            "https://sim.example.com/gateway/?x=1#frag",
        )]))
        .expect("settings");
        assert_eq!(settings.base_url, "https://sim.example.com/gateway");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("SIM_BASE_URL", "ftp://sim.example.com")]))
            .expect_err("must reject");
        assert!(matches!(err, SettingsError::UnsupportedScheme { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("SIM_TIMEOUT_MS", "0")])).expect_err("zero");
        assert!(matches!(err, SettingsError::InvalidNumber { key: "SIM_TIMEOUT_MS", .. }));
    }

    #[test]
    fn auth_failure_codes_parse_from_comma_list() {
        let settings =
            Settings::from_lookup(lookup(&[("SIM_AUTH_FAILURE_CODES", "401, 403,40101")]))
                .expect("settings");
        assert_eq!(settings.auth_failure_codes, vec![401, 403, 40101]);

        let err = Settings::from_lookup(lookup(&[("SIM_AUTH_FAILURE_CODES", "401,abc")]))
            .expect_err("bad list");
        assert!(matches!(err, SettingsError::InvalidCodeList { .. }));
    }

    #[test]
    fn blank_auth_scheme_means_raw_token() {
        let settings =
            Settings::from_lookup(lookup(&[("SIM_AUTH_SCHEME", "  ")])).expect("settings");
        assert_eq!(settings.auth_scheme, None);
        let settings =
            Settings::from_lookup(lookup(&[("SIM_AUTH_SCHEME", "Bearer")])).expect("settings");
        assert_eq!(settings.auth_scheme.as_deref(), Some("Bearer"));
    }

    #[test]
    fn cli_overrides_replace_env_values() {
        let settings = Settings::default()
            .with_base_url("http://127.0.0.1:8080/")
            .and_then(|s| s.with_request_timeout_ms(500))
            .expect("overrides");
        assert_eq!(settings.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.request_timeout, Duration::from_millis(500));
    }
}

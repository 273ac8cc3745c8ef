//! Backend configuration loaded from environment variables.
//!
//! Missing or malformed Record Store / Media Host settings are detected here,
//! up front, so the Access Layer can run "unconfigured" instead of issuing
//! calls that are bound to fail.

use std::str::FromStr;
use std::time::Duration;

/// Default Record Store request timeout.
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;

/// Default Media Host request timeout (uploads can be large).
const DEFAULT_MEDIA_TIMEOUT_SECS: u64 = 120;

/// Default Media Host API origin.
pub const DEFAULT_MEDIA_BASE_URL: &str = "https://api.cloudinary.com";

/// Default pause between items of a bulk delete.
const DEFAULT_BULK_DELAY_MS: u64 = 150;

/// Default number of record-delete attempts per removal.
const DEFAULT_MAX_DELETE_ATTEMPTS: u32 = 2;

/// Why a configuration could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is malformed: {reason}")]
    Malformed { name: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Record Store
// ---------------------------------------------------------------------------

/// Connection settings for the Record Store.
///
/// | Env Var                  | Default |
/// |--------------------------|---------|
/// | `STORE_URL`              | --      |
/// | `STORE_API_KEY`          | --      |
/// | `STORE_DELETE_PROCEDURE` | unset   |
/// | `STORE_TIMEOUT_SECS`     | `15`    |
#[derive(Clone)]
pub struct StoreConfig {
    /// Project origin, without trailing slash.
    pub url: String,
    pub api_key: String,
    /// Stored procedure used as the alternate deletion entry point.
    pub delete_procedure: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("delete_procedure", &self.delete_procedure)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    pub fn new(url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: validate_origin("STORE_URL", url)?,
            api_key: validate_key("STORE_API_KEY", api_key)?,
            delete_procedure: None,
            timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        })
    }

    pub fn with_delete_procedure(mut self, name: &str) -> Result<Self, ConfigError> {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ConfigError::Malformed {
                name: "STORE_DELETE_PROCEDURE",
                reason: format!("'{name}' is not a valid procedure name"),
            });
        }
        self.delete_procedure = Some(name.to_string());
        Ok(self)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("STORE_URL").ok_or(ConfigError::Missing("STORE_URL"))?;
        let api_key = lookup("STORE_API_KEY").ok_or(ConfigError::Missing("STORE_API_KEY"))?;

        let mut config = Self::new(&url, &api_key)?;
        if let Some(procedure) = lookup("STORE_DELETE_PROCEDURE").filter(|p| !p.trim().is_empty()) {
            config = config.with_delete_procedure(procedure.trim())?;
        }
        config.timeout = Duration::from_secs(parse_or_default(
            &lookup,
            "STORE_TIMEOUT_SECS",
            DEFAULT_STORE_TIMEOUT_SECS,
        ));
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Media Host
// ---------------------------------------------------------------------------

/// Connection settings for the Media Host.
///
/// | Env Var               | Default                      |
/// |-----------------------|------------------------------|
/// | `MEDIA_CLOUD_NAME`    | --                           |
/// | `MEDIA_UPLOAD_PRESET` | --                           |
/// | `MEDIA_API_KEY`       | unset (destroy disabled)     |
/// | `MEDIA_API_SECRET`    | unset (destroy disabled)     |
/// | `MEDIA_BASE_URL`      | `https://api.cloudinary.com` |
#[derive(Clone)]
pub struct MediaHostConfig {
    pub base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for MediaHostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHostConfig")
            .field("base_url", &self.base_url)
            .field("cloud_name", &self.cloud_name)
            .field("upload_preset", &self.upload_preset)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MediaHostConfig {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
            cloud_name: validate_key("MEDIA_CLOUD_NAME", cloud_name)?,
            upload_preset: validate_key("MEDIA_UPLOAD_PRESET", upload_preset)?,
            api_key: None,
            api_secret: None,
            timeout: Duration::from_secs(DEFAULT_MEDIA_TIMEOUT_SECS),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = validate_origin("MEDIA_BASE_URL", base_url)?;
        Ok(self)
    }

    pub fn with_credentials(mut self, api_key: &str, api_secret: &str) -> Result<Self, ConfigError> {
        self.api_key = Some(validate_key("MEDIA_API_KEY", api_key)?);
        self.api_secret = Some(validate_key("MEDIA_API_SECRET", api_secret)?);
        Ok(self)
    }

    /// Whether signed asset deletion is possible.
    pub fn can_destroy(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cloud = lookup("MEDIA_CLOUD_NAME").ok_or(ConfigError::Missing("MEDIA_CLOUD_NAME"))?;
        let preset =
            lookup("MEDIA_UPLOAD_PRESET").ok_or(ConfigError::Missing("MEDIA_UPLOAD_PRESET"))?;

        let mut config = Self::new(&cloud, &preset)?;
        if let Some(base_url) = lookup("MEDIA_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }
        match (lookup("MEDIA_API_KEY"), lookup("MEDIA_API_SECRET")) {
            (Some(key), Some(secret)) => config = config.with_credentials(&key, &secret)?,
            (None, None) => {}
            _ => {
                return Err(ConfigError::Malformed {
                    name: "MEDIA_API_KEY",
                    reason: "MEDIA_API_KEY and MEDIA_API_SECRET must be set together".into(),
                })
            }
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Access Layer tuning
// ---------------------------------------------------------------------------

/// Throttle and retry settings for the Access Layer.
///
/// | Env Var                | Default |
/// |------------------------|---------|
/// | `BULK_DELETE_DELAY_MS` | `150`   |
/// | `MAX_DELETE_ATTEMPTS`  | `2`     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// Pause interposed between items of a bulk delete.
    pub bulk_delay: Duration,
    /// Record-delete attempts before a removal is reported as failed.
    pub max_delete_attempts: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            bulk_delay: Duration::from_millis(DEFAULT_BULK_DELAY_MS),
            max_delete_attempts: DEFAULT_MAX_DELETE_ATTEMPTS,
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bulk_delay: Duration::from_millis(parse_or_default(
                &lookup,
                "BULK_DELETE_DELAY_MS",
                DEFAULT_BULK_DELAY_MS,
            )),
            max_delete_attempts: parse_or_default(
                &lookup,
                "MAX_DELETE_ATTEMPTS",
                DEFAULT_MAX_DELETE_ATTEMPTS,
            )
            .max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accept an absolute http(s) origin with a host; strip trailing slashes.
fn validate_origin(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::Malformed {
        name,
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Malformed {
            name,
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Malformed {
            name,
            reason: "missing host".into(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Accept a non-empty token without inner whitespace.
fn validate_key(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::Malformed {
            name,
            reason: "contains whitespace".into(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, %default, "Invalid value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn store_config_requires_url_and_key() {
        assert_matches!(
            StoreConfig::from_vars(vars(&[])),
            Err(ConfigError::Missing("STORE_URL"))
        );
        assert_matches!(
            StoreConfig::from_vars(vars(&[("STORE_URL", "https://x.example.co")])),
            Err(ConfigError::Missing("STORE_API_KEY"))
        );
    }

    #[test]
    fn store_config_rejects_malformed_values() {
        assert_matches!(
            StoreConfig::new("not a url", "key"),
            Err(ConfigError::Malformed { name: "STORE_URL", .. })
        );
        assert_matches!(
            StoreConfig::new("ftp://x.example.co", "key"),
            Err(ConfigError::Malformed { name: "STORE_URL", .. })
        );
        assert_matches!(
            StoreConfig::new("https://x.example.co", "two words"),
            Err(ConfigError::Malformed { name: "STORE_API_KEY", .. })
        );
        assert_matches!(
            StoreConfig::new("https://x.example.co", "   "),
            Err(ConfigError::Missing("STORE_API_KEY"))
        );
    }

    #[test]
    fn store_config_normalizes_and_reads_optionals() {
        let config = StoreConfig::from_vars(vars(&[
            ("STORE_URL", " https://x.example.co/ "),
            ("STORE_API_KEY", "anon.jwt.key"),
            ("STORE_DELETE_PROCEDURE", "delete_portfolio_item"),
            ("STORE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.url, "https://x.example.co");
        assert_eq!(config.delete_procedure.as_deref(), Some("delete_portfolio_item"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!format!("{config:?}").contains("anon.jwt.key"));
    }

    #[test]
    fn invalid_procedure_name_is_rejected() {
        let config = StoreConfig::new("https://x.example.co", "k").unwrap();
        assert_matches!(
            config.with_delete_procedure("drop table;"),
            Err(ConfigError::Malformed { .. })
        );
    }

    #[test]
    fn media_config_credentials_come_in_pairs() {
        let base = [("MEDIA_CLOUD_NAME", "studio"), ("MEDIA_UPLOAD_PRESET", "unsigned")];
        let config = MediaHostConfig::from_vars(vars(&base)).unwrap();
        assert!(!config.can_destroy());
        assert_eq!(config.base_url, DEFAULT_MEDIA_BASE_URL);

        let mut with_key = base.to_vec();
        with_key.push(("MEDIA_API_KEY", "123"));
        assert_matches!(
            MediaHostConfig::from_vars(vars(&with_key)),
            Err(ConfigError::Malformed { .. })
        );

        with_key.push(("MEDIA_API_SECRET", "shh"));
        assert!(MediaHostConfig::from_vars(vars(&with_key)).unwrap().can_destroy());
    }

    #[test]
    fn access_config_falls_back_on_invalid_numbers() {
        let config = AccessConfig::from_vars(vars(&[
            ("BULK_DELETE_DELAY_MS", "soon"),
            ("MAX_DELETE_ATTEMPTS", "0"),
        ]));
        assert_eq!(config.bulk_delay, Duration::from_millis(150));
        assert_eq!(config.max_delete_attempts, 1);
    }
}

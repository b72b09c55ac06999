use crate::adapters::http::DEFAULT_GEO_LOOKUP_URL;
use crate::core::account::DEFAULT_ADMIN_USERNAMES;
use crate::core::live_stream::StreamOptions;
use crate::core::feed::FeedOptions;
use crate::core::registration::DEFAULT_REGISTER_ENDPOINT;
use crate::core::transform::TelemetryMode;
use crate::utils::error::{ClientError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

/// `castolo.toml`. Todas las secciones son opcionales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
    pub view: ViewConfig,
    pub storage: StorageConfig,
    pub registration: RegistrationConfig,
    pub admin: AdminConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: Some(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub reconnect_interval_ms: u64,
    pub max_reconnect_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 3000,
            max_reconnect_attempts: 10,
            poll_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub telemetry: TelemetryMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ".castolo/storage.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub endpoint: String,
    /// Si está definido, reemplaza al serial que escribe el jugador
    pub official_serial: Option<String>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REGISTER_ENDPOINT.to_string(),
            official_serial: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub poll_interval_seconds: u64,
    pub users_per_page: u32,
    pub admin_usernames: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 10,
            users_per_page: 20,
            admin_usernames: DEFAULT_ADMIN_USERNAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub lookup_url: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_GEO_LOOKUP_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Carga la configuración desde un archivo TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ClientError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ClientError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Reemplaza variables de entorno (p. ej. `${CASTOLO_URL}`); las no definidas quedan tal cual
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.server.timeout_seconds.map(Duration::from_secs)
    }

    pub fn stream_options(&self, url: impl Into<String>) -> StreamOptions {
        StreamOptions::new(url)
            .with_reconnect_interval(Duration::from_millis(self.stream.reconnect_interval_ms))
            .with_max_reconnect_attempts(self.stream.max_reconnect_attempts)
    }

    pub fn feed_options(&self, url: impl Into<String>) -> FeedOptions {
        FeedOptions::new(self.stream_options(url))
            .with_poll_interval(Duration::from_millis(self.stream.poll_interval_ms))
    }

    pub fn admin_poll_interval(&self) -> Duration {
        Duration::from_secs(self.admin.poll_interval_seconds)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("server.base_url", &self.server.base_url)?;
        if let Some(timeout) = self.server.timeout_seconds {
            validation::validate_positive_number("server.timeout_seconds", timeout, 1)?;
        }

        validation::validate_positive_number(
            "stream.reconnect_interval_ms",
            self.stream.reconnect_interval_ms,
            1,
        )?;
        validation::validate_positive_number(
            "stream.poll_interval_ms",
            self.stream.poll_interval_ms,
            100,
        )?;

        validation::validate_path("storage.path", &self.storage.path)?;
        validation::validate_endpoint_path("registration.endpoint", &self.registration.endpoint)?;

        validation::validate_positive_number(
            "admin.poll_interval_seconds",
            self.admin.poll_interval_seconds,
            1,
        )?;
        validation::validate_range("admin.users_per_page", self.admin.users_per_page, 1, 500)?;
        if self.admin.admin_usernames.is_empty() {
            return Err(ClientError::MissingConfigError {
                field: "admin.admin_usernames".to_string(),
            });
        }
        for name in &self.admin.admin_usernames {
            validation::validate_non_empty_string("admin.admin_usernames", name)?;
        }

        validation::validate_url("geo.lookup_url", &self.geo.lookup_url)?;

        Ok(())
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.stream.reconnect_interval_ms, 3000);
        assert_eq!(config.stream.max_reconnect_attempts, 10);
        assert_eq!(config.stream.poll_interval_ms, 5000);
        assert_eq!(config.registration.endpoint, "/register");
        assert_eq!(config.admin.admin_usernames, vec!["admin", "juce", "reddwarf"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
base_url = "https://castolo.example"
timeout_seconds = 5

[stream]
reconnect_interval_ms = 1000
max_reconnect_attempts = 3

[view]
telemetry = "synthesized"

[registration]
endpoint = "/api/register"
official_serial = "ABCDEFGHIJKL12345678"

[admin]
users_per_page = 50
"#;
        let config = ClientConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.base_url, "https://castolo.example");
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.view.telemetry, TelemetryMode::Synthesized);
        assert_eq!(config.stream.poll_interval_ms, 5000);
        assert_eq!(
            config.registration.official_serial.as_deref(),
            Some("ABCDEFGHIJKL12345678")
        );
        assert_eq!(config.admin.users_per_page, 50);

        let options = config.feed_options("wss://castolo.example/api/ws/stats");
        assert_eq!(options.stream.reconnect_interval, Duration::from_millis(1000));
        assert_eq!(options.stream.max_reconnect_attempts, 3);
        assert_eq!(options.poll_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CASTOLO_TEST_BASE_URL", "http://10.0.0.5:8080");
        let config = ClientConfig::from_toml_str(
            r#"
[server]
base_url = "${CASTOLO_TEST_BASE_URL}"
"#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://10.0.0.5:8080");
        std::env::remove_var("CASTOLO_TEST_BASE_URL");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let config = ClientConfig::from_toml_str(
            r#"
[server]
base_url = "${CASTOLO_SURELY_UNDEFINED_VAR}"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ClientConfig::default();
        config.registration.endpoint = "register".to_string();
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidConfigValueError { field, .. }) if field == "registration.endpoint"
        ));

        let mut config = ClientConfig::default();
        config.admin.users_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_admin_usernames_required() {
        let config = ClientConfig::from_toml_str("[admin]\nadmin_usernames = []").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            &err,
            ClientError::MissingConfigError { field } if field == "admin.admin_usernames"
        ));
        assert_eq!(err.exit_code(), 4);

        let config =
            ClientConfig::from_toml_str("[admin]\nadmin_usernames = [\"juce\", \"  \"]").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidConfigValueError { field, .. }) if field == "admin.admin_usernames"
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ClientConfig::from_toml_str("[server\nbase_url = 1");
        assert!(matches!(
            result,
            Err(ClientError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\npath = \"/tmp/castolo-test.json\"").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.storage.path, "/tmp/castolo-test.json");
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;
use telegate_core::{DEFAULT_LIMIT, Error, Result};
use telegate_ingress::routes::DEFAULT_MAX_BODY_BYTES;
use telegate_observability::LoggingConfig;
use telegate_storage::StorageConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Mount point of the telemetry API
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Points per key returned by a windowed read without `limit`
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
            logging: LoggingConfig::default(),
            telemetry: TelemetryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a YAML file, or TOML when the extension is `.toml`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Invalid YAML in {}: {}", path.display(), e)))
        }
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TELEGATE_HOST") {
            self.host = val;
        }
        if let Some(port) = parse_env("TELEGATE_PORT")? {
            self.port = port;
        }
        if let Ok(val) = std::env::var("TELEGATE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("TELEGATE_LOG_FORMAT") {
            self.logging.format = val.parse()?;
        }
        if let Some(limit) = parse_env("TELEGATE_DEFAULT_LIMIT")? {
            self.telemetry.default_limit = limit;
        }
        if let Some(max) = parse_env("TELEGATE_MAX_BODY_BYTES")? {
            self.telemetry.max_body_bytes = max;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.telemetry.default_limit == 0 {
            return Err(Error::Config("telemetry.default_limit must be greater than 0".to_string()));
        }
        if self.telemetry.max_body_bytes == 0 {
            return Err(Error::Config("telemetry.max_body_bytes must be greater than 0".to_string()));
        }
        if !self.base_path.starts_with('/') || self.base_path.len() < 2 || self.base_path.ends_with('/') {
            return Err(Error::Config(format!(
                "base_path must start with '/' and not end with '/': {}",
                self.base_path
            )));
        }
        self.storage
            .validate()
            .map_err(|e| Error::Config(format!("storage: {}", e)))?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {}: {}", name, val))),
        Err(_) => Ok(None),
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_base_path() -> String {
    "/api/plugins/telemetry".to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use telegate_observability::LogFormat;

    const ENV_VARS: [&str; 6] = [
        "TELEGATE_HOST",
        "TELEGATE_PORT",
        "TELEGATE_LOG_LEVEL",
        "TELEGATE_LOG_FORMAT",
        "TELEGATE_DEFAULT_LIMIT",
        "TELEGATE_MAX_BODY_BYTES",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { std::env::remove_var(var) };
        }
    }

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.base_path, "/api/plugins/telemetry");
        assert_eq!(config.telemetry.default_limit, DEFAULT_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "port: 9000\nlogging:\n  level: debug\n  format: json\ntelemetry:\n  default_limit: 50\n",
        );
        let config = ServerConfig::from_file(file.path()).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.telemetry.default_limit, 50);
        assert_eq!(config.telemetry.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            "host = \"0.0.0.0\"\nbase_path = \"/telemetry\"\n\n[storage]\nmax_points_per_key = 500\n",
        );
        let config = ServerConfig::from_file(file.path()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.base_path, "/telemetry");
        assert_eq!(config.storage.max_points_per_key, 500);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let file = write_config(".yaml", "port: [not a port\n");
        assert!(matches!(ServerConfig::from_file(file.path()), Err(Error::Config(_))));
        assert!(matches!(
            ServerConfig::from_file("/nonexistent/telegate.yaml"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validation_rules() {
        let mut config = ServerConfig::default();
        config.telemetry.default_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.base_path = "telemetry/".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.storage.max_points_per_key = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("TELEGATE_PORT", "9100");
            std::env::set_var("TELEGATE_LOG_FORMAT", "json");
            std::env::set_var("TELEGATE_DEFAULT_LIMIT", "25");
        }

        let mut config = ServerConfig::default();
        config.merge_env().unwrap();
        clear_env();

        assert_eq!(config.port, 9100);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.telemetry.default_limit, 25);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        clear_env();
        unsafe { std::env::set_var("TELEGATE_PORT", "eighty") };

        let mut config = ServerConfig::default();
        let result = config.merge_env();
        clear_env();

        assert!(matches!(result, Err(Error::Config(_))));
    }
}

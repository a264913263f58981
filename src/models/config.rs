//! Configuration data model and validation

use crate::logging::{LogFormat, LogLevel};
use crate::types::{AppError, OutputMode, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Benchmarking CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Probes issued per region
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,

    /// Maximum number of probes in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-probe timeout, zero disables it
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Restrict the run to a single region
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub output_mode: OutputMode,

    /// Log every probe as it starts and finishes
    #[serde(default)]
    pub verbose: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Remote directory to probe instead of the builtin table
    #[serde(default)]
    pub endpoints_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            concurrency: default_concurrency(),
            timeout: default_timeout(),
            region: None,
            output_mode: OutputMode::default(),
            verbose: false,
            enable_color: default_enable_color(),
            endpoints_url: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err(AppError::validation("Region cannot be empty"));
            }
        }

        if let Some(url) = &self.endpoints_url {
            validate_http_url(url, "endpoints URL")?;
        }

        Ok(())
    }

    /// Effective output mode once a single region is requested
    pub fn effective_output_mode(&self) -> OutputMode {
        match (&self.region, self.output_mode) {
            // A raw probe stream still makes sense for one region
            (Some(_), OutputMode::Csv) => OutputMode::Csv,
            (Some(_), _) => OutputMode::Single,
            (None, mode) => mode,
        }
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary key lookup, used by `merge_from_env`
    pub fn merge_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(count) = lookup("PROBE_COUNT") {
            self.repetitions = count.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_COUNT value '{}': {}", count, e)))?;
        }

        if let Some(concurrency) = lookup("PROBE_CONCURRENCY") {
            self.concurrency = concurrency.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_CONCURRENCY value '{}': {}", concurrency, e)))?;
        }

        if let Some(timeout) = lookup("PROBE_TIMEOUT") {
            self.timeout = crate::cli::parse_duration(timeout.trim())
                .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Some(url) = lookup("ENDPOINTS_URL") {
            let url = url.trim();
            self.endpoints_url = if url.is_empty() { None } else { Some(url.to_string()) };
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Ping service configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Region identifier returned by the ping routes
    pub region: String,
    /// Authoritative directory source, builtin table when unset
    pub endpoints_url: Option<String>,
    /// Directory served for unmatched paths
    pub static_root: PathBuf,
    pub cache_ttl: Duration,
    pub refresh_timeout: Duration,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: crate::defaults::DEFAULT_PORT,
            region: crate::defaults::DEFAULT_SERVER_REGION.to_string(),
            endpoints_url: None,
            static_root: PathBuf::from(crate::defaults::DEFAULT_STATIC_ROOT),
            cache_ttl: crate::defaults::DEFAULT_CACHE_TTL,
            refresh_timeout: crate::defaults::DEFAULT_REFRESH_TIMEOUT,
            log_level: LogLevel::Info,
            log_format: LogFormat::Console,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = non_empty("PORT") {
            config.port = port.parse()
                .map_err(|e| AppError::config(format!("Invalid PORT value '{}': {}", port, e)))?;
        }

        if let Some(region) = non_empty("REGION") {
            config.region = region;
        }

        if let Some(url) = non_empty("ENDPOINTS_URL") {
            validate_http_url(&url, "ENDPOINTS_URL")?;
            config.endpoints_url = Some(url);
        }

        if let Some(root) = non_empty("STATIC_ROOT").or_else(|| non_empty("KO_DATA_PATH")) {
            config.static_root = PathBuf::from(root);
        }

        if let Some(ttl) = non_empty("CACHE_TTL_SECONDS") {
            let secs: u64 = ttl.parse()
                .map_err(|e| AppError::config(format!("Invalid CACHE_TTL_SECONDS value '{}': {}", ttl, e)))?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(timeout) = non_empty("REFRESH_TIMEOUT_SECONDS") {
            let secs: u64 = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid REFRESH_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
            if secs == 0 {
                return Err(AppError::config("REFRESH_TIMEOUT_SECONDS must be greater than 0"));
            }
            config.refresh_timeout = Duration::from_secs(secs);
        }

        if let Some(level) = non_empty("LOG_LEVEL") {
            config.log_level = level.parse()?;
        }

        if let Some(format) = non_empty("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        Ok(config)
    }

    /// Address the listener binds to
    pub fn bind_address(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn validate_http_url(url: &str, what: &str) -> Result<()> {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(parsed) => Err(AppError::config(format!(
            "Invalid {} '{}': unsupported scheme '{}'", what, url, parsed.scheme()
        ))),
        Err(e) => Err(AppError::config(format!("Invalid {} '{}': {}", what, url, e))),
    }
}

// Default value functions for serde
fn default_repetitions() -> u32 {
    crate::defaults::DEFAULT_REPETITIONS
}

fn default_concurrency() -> usize {
    crate::defaults::DEFAULT_CONCURRENCY
}

fn default_timeout() -> Duration {
    crate::defaults::DEFAULT_TIMEOUT
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.repetitions, 10);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, Duration::ZERO);
        assert_eq!(config.output_mode, OutputMode::Table);
    }

    #[test]
    fn test_zero_concurrency_invalid() {
        let mut config = Config::default();
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_repetitions_is_valid() {
        let mut config = Config::default();
        config.repetitions = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_region_invalid() {
        let mut config = Config::default();
        config.region = Some("  ".to_string());
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_endpoints_url_must_be_http() {
        let mut config = Config::default();
        config.endpoints_url = Some("ftp://example.com/endpoints".to_string());
        assert!(config.validate().is_err());

        config.endpoints_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.endpoints_url = Some("https://example.com/api/endpoints".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_output_mode() {
        let mut config = Config::default();
        config.output_mode = OutputMode::Top;
        assert_eq!(config.effective_output_mode(), OutputMode::Top);

        config.region = Some("us-east1".to_string());
        assert_eq!(config.effective_output_mode(), OutputMode::Single);

        config.output_mode = OutputMode::Csv;
        assert_eq!(config.effective_output_mode(), OutputMode::Csv);
    }

    #[test]
    fn test_merge_from_lookup() {
        let mut config = Config::default();
        config.merge_from(lookup_from(&[
            ("PROBE_COUNT", "3"),
            ("PROBE_CONCURRENCY", "4"),
            ("PROBE_TIMEOUT", "1s500ms"),
            ("ENDPOINTS_URL", "http://localhost:9000/api/endpoints"),
            ("ENABLE_COLOR", "false"),
        ])).unwrap();

        assert_eq!(config.repetitions, 3);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.endpoints_url.as_deref(), Some("http://localhost:9000/api/endpoints"));
        assert!(!config.enable_color);
    }

    #[test]
    fn test_merge_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.merge_from(lookup_from(&[("PROBE_COUNT", "many")])).is_err());
        assert!(config.merge_from(lookup_from(&[("PROBE_TIMEOUT", "5 parsecs")])).is_err());
        assert!(config.merge_from(lookup_from(&[("ENABLE_COLOR", "sometimes")])).is_err());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.region, "pong");
        assert_eq!(config.static_root, PathBuf::from("/var/run/ko/"));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.bind_address().port(), 8080);
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("REGION", "europe-west1"),
            ("ENDPOINTS_URL", "https://example.com/api/endpoints"),
            ("KO_DATA_PATH", "/srv/ko"),
            ("CACHE_TTL_SECONDS", "30"),
            ("REFRESH_TIMEOUT_SECONDS", "2"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
        ])).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.region, "europe-west1");
        assert_eq!(config.static_root, PathBuf::from("/srv/ko"));
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.refresh_timeout, Duration::from_secs(2));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_static_root_prefers_explicit_setting() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("STATIC_ROOT", "/srv/www"),
            ("KO_DATA_PATH", "/srv/ko"),
        ])).unwrap();
        assert_eq!(config.static_root, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_server_config_rejects_bad_values() {
        assert!(ServerConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("REFRESH_TIMEOUT_SECONDS", "0")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("LOG_LEVEL", "chatty")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("ENDPOINTS_URL", "file:///etc/passwd")])).is_err());
    }
}

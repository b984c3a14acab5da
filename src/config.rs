//! Service configuration: a TOML file with every section defaulted, then
//! `PDF2CSV_*` environment overrides, then validation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::ExtractionSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub limits: LimitsSettings,
    pub cors: CorsSettings,
    pub extraction: ExtractionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 0 = one worker per CPU
    #[serde(default)]
    pub workers: usize,
    /// Where per-upload scratch directories go; the system temp dir if unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Exact origins. `["*"]`, or an empty list without a regex, allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Origins fully matching this pattern are allowed too
    #[serde(default)]
    pub allowed_origin_regex: Option<String>,

    #[serde(default = "default_true")]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_cors_max_age")]
    pub max_age: usize,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_origin_regex: None,
            allow_credentials: true,
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Per-target level overrides, e.g. `pdf2csv::document = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024 // 50MB
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_cors_max_age() -> usize {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const VALID_FORMATS: [&str; 2] = ["compact", "json"];

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.as_ref().display(), e))?;

        Self::from_toml(&content)?.finish()
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> anyhow::Result<Self> {
        Config::default().finish()
    }

    fn finish(mut self) -> anyhow::Result<Self> {
        self.apply_env_overrides()?;
        self.normalize();
        self.validate()?;
        Ok(self)
    }

    /// Lowercase level and format names, wherever they came from
    pub fn normalize(&mut self) {
        let logging = &mut self.logging;
        logging.level = logging.level.trim().to_lowercase();
        logging.format = logging.format.trim().to_lowercase();
        for level in logging.targets.values_mut() {
            *level = level.trim().to_lowercase();
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PDF2CSV_HOST, PDF2CSV_PORT, PDF2CSV_WORKERS, PDF2CSV_TEMP_DIR
    /// - PDF2CSV_MAX_UPLOAD_BYTES
    /// - PDF2CSV_LOG_LEVEL, PDF2CSV_LOG_FORMAT
    /// - PDF2CSV_CORS_ORIGINS (comma-separated), PDF2CSV_CORS_ORIGIN_REGEX
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> anyhow::Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", key, value))
        }

        if let Some(host) = var("PDF2CSV_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PDF2CSV_PORT") {
            self.server.port = parsed("PDF2CSV_PORT", port)?;
        }
        if let Some(workers) = var("PDF2CSV_WORKERS") {
            self.server.workers = parsed("PDF2CSV_WORKERS", workers)?;
        }
        if let Some(dir) = var("PDF2CSV_TEMP_DIR") {
            self.server.temp_dir = Some(PathBuf::from(dir)).filter(|d| !d.as_os_str().is_empty());
        }
        if let Some(bytes) = var("PDF2CSV_MAX_UPLOAD_BYTES") {
            self.limits.max_upload_bytes = parsed("PDF2CSV_MAX_UPLOAD_BYTES", bytes)?;
        }
        if let Some(level) = var("PDF2CSV_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PDF2CSV_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(origins) = var("PDF2CSV_CORS_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(pattern) = var("PDF2CSV_CORS_ORIGIN_REGEX") {
            self.cors.allowed_origin_regex = Some(pattern).filter(|p| !p.trim().is_empty());
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            ));
        }
        for (target, level) in &self.logging.targets {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    VALID_LEVELS.join(", ")
                ));
            }
        }
        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                VALID_FORMATS.join(", ")
            ));
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("max_upload_bytes cannot be 0"));
        }

        if let Some(pattern) = &self.cors.allowed_origin_regex {
            Regex::new(pattern).map_err(|e| anyhow::anyhow!("Invalid allowed_origin_regex '{}': {}", pattern, e))?;
        }

        let lattice = &self.extraction.lattice;
        let tolerances = [
            ("lattice.snap_tolerance", lattice.snap_tolerance),
            ("lattice.join_tolerance", lattice.join_tolerance),
            ("lattice.line_thickness", lattice.line_thickness),
            ("lattice.min_segment_length", lattice.min_segment_length),
            ("stream.column_tolerance", self.extraction.stream.column_tolerance),
            ("stream.word_gap_ratio", self.extraction.stream.word_gap_ratio),
        ];
        for (name, value) in tolerances {
            if !(value.is_finite() && value >= 0.0) {
                return Err(anyhow::anyhow!("extraction.{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.extraction.stream.min_rows == 0 || self.extraction.stream.min_columns == 0 {
            return Err(anyhow::anyhow!("extraction.stream.min_rows and min_columns must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.limits.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.extraction, ExtractionSettings::default());
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = Config::from_toml(include_str!("../config.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction, ExtractionSettings::default());
        assert_eq!(config.limits.max_upload_bytes, default_max_upload_bytes());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9090

            [cors]
            allowed_origin_regex = "^https://.*\\.example\\.com$"

            [extraction]
            column_index_header = true

            [extraction.stream]
            min_rows = 3

            [logging.targets]
            "pdf2csv::document" = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.cors.allow_credentials);
        assert!(config.extraction.column_index_header);
        assert_eq!(config.extraction.stream.min_rows, 3);
        assert_eq!(config.extraction.stream.min_columns, 2);
        assert_eq!(config.extraction.lattice.snap_tolerance, 2.0);
        assert_eq!(config.logging.targets["pdf2csv::document"], "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_value_type_rejected() {
        assert!(Config::from_toml("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_level_names_are_case_insensitive() {
        let mut config = Config::from_toml(
            r#"
            [logging]
            level = "INFO"
            format = "Json"

            [logging.targets]
            "pdf2csv::server" = " Debug "
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        config.normalize();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.targets["pdf2csv::server"], "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_levels_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdf2csv.toml");
        fs::write(&path, "[logging]\nlevel = \"WARN\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_and_format() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.targets.insert("actix_web".into(), "chatty".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_origin_regex() {
        let mut config = Config::default();
        config.cors.allowed_origin_regex = Some("(unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut config = Config::default();
        config.extraction.lattice.snap_tolerance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(overrides(&[
                ("PDF2CSV_HOST", "0.0.0.0"),
                ("PDF2CSV_PORT", "9000"),
                ("PDF2CSV_WORKERS", "4"),
                ("PDF2CSV_TEMP_DIR", "/var/tmp/pdf2csv"),
                ("PDF2CSV_LOG_LEVEL", "DEBUG"),
                ("PDF2CSV_CORS_ORIGINS", "https://a.example, https://b.example,"),
                ("PDF2CSV_CORS_ORIGIN_REGEX", "^https://.*\\.vercel\\.app$"),
            ]))
            .unwrap();
        config.normalize();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.server.temp_dir, Some(PathBuf::from("/var/tmp/pdf2csv")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.cors.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.cors.allowed_origin_regex.as_deref(), Some("^https://.*\\.vercel\\.app$"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_bad_number() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(overrides(&[("PDF2CSV_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PDF2CSV_PORT"));
    }

    #[test]
    fn test_empty_regex_override_clears_pattern() {
        let mut config = Config::default();
        config.cors.allowed_origin_regex = Some(".*".to_string());
        config
            .apply_overrides(overrides(&[("PDF2CSV_CORS_ORIGIN_REGEX", "")]))
            .unwrap();
        assert!(config.cors.allowed_origin_regex.is_none());
    }
}

//! Configuration for the colporter admin CLI

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub program: ProgramSection,
    #[serde(default)]
    pub cache: CacheSection,
}

/// REST API connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the program API (e.g. https://admin.example.org/api)
    pub base_url: String,
    /// Bearer token used until a refreshed one is stored in the session file
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgramSection {
    /// Program used when --program is not given
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub dashboard_stats_ttl_secs: Option<u64>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Missing required fields (api.base_url)\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (strings vs numbers)\n\n\
             See config.toml.example for the expected format."
        })
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Main configuration struct with resolved values
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL without a trailing slash
    pub base_url: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub timeout: Duration,
    /// Program the reports are computed for
    pub program_id: Option<String>,
    pub dashboard_stats_ttl: Duration,
    /// Where refreshed tokens are persisted
    pub session_path: PathBuf,
}

impl Config {
    /// Create config from file config and CLI overrides
    pub fn from_file(
        file_config: &FileConfig,
        api_url: Option<String>,
        program_id: Option<String>,
        data_dir: &Path,
    ) -> Result<Self> {
        let base_url = api_url.unwrap_or_else(|| file_config.api.base_url.clone());
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            anyhow::bail!(
                "Invalid api.base_url '{}': must start with http:// or https://",
                base_url
            );
        }

        Ok(Self {
            base_url,
            access_token: non_empty(file_config.api.access_token.as_deref()),
            refresh_token: non_empty(file_config.api.refresh_token.as_deref()),
            timeout: Duration::from_secs(
                file_config
                    .api
                    .timeout_secs
                    .unwrap_or(constants::DEFAULT_TIMEOUT_SECS),
            ),
            program_id: program_id.or_else(|| file_config.program.id.clone()),
            dashboard_stats_ttl: Duration::from_secs(
                file_config
                    .cache
                    .dashboard_stats_ttl_secs
                    .unwrap_or(constants::DEFAULT_DASHBOARD_STATS_TTL_SECS),
            ),
            session_path: data_dir.join(constants::SESSION_FILENAME),
        })
    }

    /// Program id, or a helpful error when none is configured
    pub fn require_program(&self) -> Result<&str> {
        self.program_id.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No program selected.\n\n\
                 Pass --program <id> or set [program] id in config.toml."
            )
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [api]
        base_url = "https://admin.example.org/api/"
    "#;

    const FULL: &str = r#"
        [api]
        base_url = "https://admin.example.org/api"
        access_token = "abc"
        refresh_token = ""
        timeout_secs = 10

        [program]
        id = "summer-2025"

        [cache]
        dashboard_stats_ttl_secs = 60
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = FileConfig::parse(MINIMAL).unwrap();
        let config = Config::from_file(&file, None, None, Path::new("./data")).unwrap();

        assert_eq!(config.base_url, "https://admin.example.org/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.dashboard_stats_ttl, Duration::from_secs(300));
        assert!(config.access_token.is_none());
        assert!(config.program_id.is_none());
        assert!(config.require_program().is_err());
        assert_eq!(config.session_path, Path::new("./data").join("session.json"));
    }

    #[test]
    fn test_full_config() {
        let file = FileConfig::parse(FULL).unwrap();
        let config = Config::from_file(&file, None, None, Path::new("/tmp")).unwrap();

        assert_eq!(config.access_token.as_deref(), Some("abc"));
        assert!(config.refresh_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.dashboard_stats_ttl, Duration::from_secs(60));
        assert_eq!(config.require_program().unwrap(), "summer-2025");
    }

    #[test]
    fn test_cli_overrides_win() {
        let file = FileConfig::parse(FULL).unwrap();
        let config = Config::from_file(
            &file,
            Some("http://localhost:3000".to_string()),
            Some("winter-2025".to_string()),
            Path::new("/tmp"),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.program_id.as_deref(), Some("winter-2025"));
    }

    #[test]
    fn test_invalid_base_url() {
        let file = FileConfig::parse(MINIMAL).unwrap();
        let result = Config::from_file(
            &file,
            Some("admin.example.org".to_string()),
            None,
            Path::new("."),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_api_section() {
        let err = FileConfig::parse("[program]\nid = \"x\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml.example"));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CIVIC_CONFIG_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CivicConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Preferred output mode: `pretty`, `text`, or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on any single remote call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Directory holding `config.toml` and `session.json`.
///
/// `CIVIC_CONFIG_DIR` wins; otherwise `<platform config dir>/civic`.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|dir| dir.join("civic"))
}

/// Path of the persisted login session.
#[must_use]
pub fn session_path(dir: &Path) -> PathBuf {
    dir.join("session.json")
}

/// Load `config.toml` from `dir`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(dir: &Path) -> Result<CivicConfig> {
    let path = dir.join("config.toml");
    if !path.exists() {
        return Ok(CivicConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<CivicConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the config and apply `CIVIC_API_URL` / `CIVIC_TIMEOUT_SECS` overrides.
///
/// # Errors
///
/// Returns an error on an unreadable config file or a malformed override.
pub fn resolve_config(dir: Option<&Path>) -> Result<CivicConfig> {
    let mut config = match dir {
        Some(dir) => load_config(dir)?,
        None => CivicConfig::default(),
    };
    apply_overrides(
        &mut config,
        env::var("CIVIC_API_URL").ok(),
        env::var("CIVIC_TIMEOUT_SECS").ok(),
    )?;
    Ok(config)
}

fn apply_overrides(
    config: &mut CivicConfig,
    api_url: Option<String>,
    timeout_secs: Option<String>,
) -> Result<()> {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        config.api.base_url = url.trim().to_string();
    }
    if let Some(raw) = timeout_secs {
        config.api.timeout_secs = raw
            .trim()
            .parse()
            .with_context(|| format!("CIVIC_TIMEOUT_SECS must be a whole number, got '{raw}'"))?;
    }
    anyhow::ensure!(
        config.api.timeout_secs > 0,
        "api timeout must be at least 1 second (`[api] timeout_secs` or CIVIC_TIMEOUT_SECS)"
    );
    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
    Ok(())
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.api.base_url, "http://localhost:8080/api");
        assert_eq!(cfg.api.timeout(), Duration::from_secs(30));
        assert!(cfg.output.is_none());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "output = \"json\"\n\n[api]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.api.timeout_secs, 5);
        assert_eq!(cfg.api.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[api\nbase_url = 3").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn env_overrides_win_and_trailing_slash_is_trimmed() {
        let mut cfg = CivicConfig::default();
        apply_overrides(
            &mut cfg,
            Some("https://civic.example.org/api/".to_string()),
            Some("7".to_string()),
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://civic.example.org/api");
        assert_eq!(cfg.api.timeout_secs, 7);
    }

    #[test]
    fn bad_timeout_override_is_rejected() {
        let mut cfg = CivicConfig::default();
        assert!(apply_overrides(&mut cfg, None, Some("soon".to_string())).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected_from_env_or_file() {
        let mut cfg = CivicConfig::default();
        let err = apply_overrides(&mut cfg, None, Some("0".to_string())).unwrap_err();
        assert!(err.to_string().contains("at least 1 second"), "got {err}");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[api]\ntimeout_secs = 0\n").unwrap();
        let mut cfg = load_config(dir.path()).unwrap();
        assert!(apply_overrides(&mut cfg, None, None).is_err());
    }
}

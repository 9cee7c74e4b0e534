//! Application configuration for Ementário.
//!
//! User config lives at `~/.ementario/ementario.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EmentarioError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ementario.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ementario";

// ---------------------------------------------------------------------------
// Config structs (matching ementario.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Harvest policies.
    #[serde(default)]
    pub harvest_policies: HarvestPoliciesConfig,

    /// Record source settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output document path.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Default maximum pages traversed per section.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Default maximum consecutive failed extractions per section.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lines per page assumed by the layout oracle.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            max_pages: default_max_pages(),
            max_attempts: default_max_attempts(),
            lines_per_page: default_lines_per_page(),
        }
    }
}

fn default_output_path() -> String {
    "~/ementario/ementas.md".into()
}
fn default_max_pages() -> u32 {
    10
}
fn default_max_attempts() -> u32 {
    90
}
fn default_lines_per_page() -> u32 {
    45
}

/// `[harvest_policies]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestPoliciesConfig {
    /// Organizational labels that exclude a card from harvesting.
    /// Compared against diacritics-stripped, lowercased header lines.
    #[serde(default = "default_excluded_org_terms")]
    pub excluded_org_terms: Vec<String>,

    /// Minimum ms between page requests to the source.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds for source calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bodies shorter than this are treated as unusable.
    #[serde(default = "default_min_body_len")]
    pub min_body_len: usize,
}

impl Default for HarvestPoliciesConfig {
    fn default() -> Self {
        Self {
            excluded_org_terms: default_excluded_org_terms(),
            rate_limit_ms: default_rate_limit(),
            request_timeout_secs: default_request_timeout(),
            min_body_len: default_min_body_len(),
        }
    }
}

fn default_excluded_org_terms() -> Vec<String> {
    vec![
        "1ª seção de dissídios individuais".into(),
        "2ª seção de dissídios individuais".into(),
        "seção de dissídios coletivos".into(),
    ]
}
fn default_rate_limit() -> u64 {
    500
}
fn default_request_timeout() -> u64 {
    30
}
fn default_min_body_len() -> usize {
    50
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the jurisprudence search results page.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://jurisprudencia.jt.jus.br/jurisprudencia-nacional/pesquisa".into()
}

// ---------------------------------------------------------------------------
// Harvest config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime harvest configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Maximum pages traversed per section.
    pub max_pages: u32,
    /// Maximum consecutive failed extractions per section.
    pub max_attempts: u32,
    /// Organizational labels that exclude a card.
    pub excluded_org_terms: Vec<String>,
    /// Minimum ms between page requests.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Minimum usable body length.
    pub min_body_len: usize,
    /// Lines per page assumed by the layout oracle.
    pub lines_per_page: u32,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_pages: config.defaults.max_pages,
            max_attempts: config.defaults.max_attempts,
            excluded_org_terms: config.harvest_policies.excluded_org_terms.clone(),
            rate_limit_ms: config.harvest_policies.rate_limit_ms,
            request_timeout_secs: config.harvest_policies.request_timeout_secs,
            min_body_len: config.harvest_policies.min_body_len,
            lines_per_page: config.defaults.lines_per_page,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ementario/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EmentarioError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ementario/ementario.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EmentarioError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EmentarioError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EmentarioError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EmentarioError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EmentarioError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` in a configured path against the user's home.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_path"));
        assert!(toml_str.contains("excluded_org_terms"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_pages, 10);
        assert_eq!(parsed.harvest_policies.excluded_org_terms.len(), 3);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
max_pages = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.max_pages, 3);
        assert_eq!(config.defaults.max_attempts, 90);
        assert_eq!(config.harvest_policies.rate_limit_ms, 500);
    }

    #[test]
    fn harvest_config_from_app_config() {
        let app = AppConfig::default();
        let harvest = HarvestConfig::from(&app);
        assert_eq!(harvest.max_pages, 10);
        assert_eq!(harvest.min_body_len, 50);
        assert_eq!(harvest.lines_per_page, 45);
    }

    #[test]
    fn tilde_expansion() {
        let plain = expand_tilde("/tmp/out.md");
        assert_eq!(plain, PathBuf::from("/tmp/out.md"));

        if dirs::home_dir().is_some() {
            let expanded = expand_tilde("~/out.md");
            assert!(!expanded.starts_with("~"));
        }
    }
}

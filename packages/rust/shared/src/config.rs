//! Application configuration for docsplit.
//!
//! User config lives at `~/.docsplit/docsplit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocsplitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docsplit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docsplit";

// ---------------------------------------------------------------------------
// Config structs (matching docsplit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Navigation, retry and selector policy.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Page rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Emit one artifact per section instead of one for the whole tree.
    #[serde(default)]
    pub split_sections: bool,

    /// Primary link region selector.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Fallback link region selector.
    #[serde(default = "default_nav_selector")]
    pub nav_selector: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            split_sections: false,
            content_selector: default_content_selector(),
            nav_selector: default_nav_selector(),
        }
    }
}

fn default_output_dir() -> String {
    "docsplit-out".into()
}
fn default_content_selector() -> String {
    "main".into()
}
fn default_nav_selector() -> String {
    "nav".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Navigation attempts per page before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles (by `backoff_multiplier`) after that.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    /// Timeout for a single navigation.
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Tries per selector before falling back to the next one.
    #[serde(default = "default_selector_attempts")]
    pub selector_attempts: u32,

    /// Fixed delay between tries of the same selector.
    #[serde(default = "default_selector_delay_ms")]
    pub selector_delay_ms: u64,

    /// How long one selector wait may poll.
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Settle delay after scrolling to the bottom, for lazily rendered link lists.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            selector_attempts: default_selector_attempts(),
            selector_delay_ms: default_selector_delay_ms(),
            selector_timeout_ms: default_selector_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_backoff_multiplier() -> u32 {
    2
}
fn default_navigation_timeout_secs() -> u64 {
    30
}
fn default_selector_attempts() -> u32 {
    3
}
fn default_selector_delay_ms() -> u64 {
    1000
}
fn default_selector_timeout_ms() -> u64 {
    5000
}
fn default_settle_delay_ms() -> u64 {
    15_000
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Timeout for fetching one page to render.
    #[serde(default = "default_render_timeout_secs")]
    pub timeout_secs: u64,

    /// Region of the page kept in the rendered document.
    /// Falls back to `defaults.content_selector` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_selector: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_render_timeout_secs(),
            content_selector: None,
        }
    }
}

fn default_render_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub content_selector: String,
    pub nav_selector: String,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
    pub navigation_timeout: Duration,
    pub selector_attempts: u32,
    pub selector_delay: Duration,
    pub selector_timeout: Duration,
    pub settle_delay: Duration,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        let fetch = &config.fetch;
        Self {
            content_selector: config.defaults.content_selector.clone(),
            nav_selector: config.defaults.nav_selector.clone(),
            max_attempts: fetch.max_attempts.max(1),
            initial_backoff: Duration::from_millis(fetch.initial_backoff_ms),
            backoff_multiplier: fetch.backoff_multiplier.max(1),
            navigation_timeout: Duration::from_secs(fetch.navigation_timeout_secs),
            selector_attempts: fetch.selector_attempts.max(1),
            selector_delay: Duration::from_millis(fetch.selector_delay_ms),
            selector_timeout: Duration::from_millis(fetch.selector_timeout_ms),
            settle_delay: Duration::from_millis(fetch.settle_delay_ms),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docsplit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocsplitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docsplit/docsplit.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| DocsplitError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocsplitError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocsplitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DocsplitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsplitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

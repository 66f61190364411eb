//! Application configuration for ratedeck.
//!
//! User config lives at `~/.ratedeck/ratedeck.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RatedeckError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ratedeck.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ratedeck";

// ---------------------------------------------------------------------------
// Config structs (matching ratedeck.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile capture settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Template binding settings.
    #[serde(default)]
    pub template: TemplateConfig,

    /// PDF export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[capture]` section — per-entry profile screenshot behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Viewport width in CSS pixels, fixed for consistent layout.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height in CSS pixels.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Hard navigation timeout in seconds.
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Unconditional settle delay after navigation, in milliseconds.
    /// Third-party profile pages expose no readiness signal, so this
    /// trades latency for capture reliability. Tunable, not load-bearing.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1280
}
fn default_viewport_height() -> u32 {
    800
}
fn default_navigation_timeout_secs() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    5000
}

/// `[template]` section — markup template and formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Path to an external Handlebars template. Absence is not an error;
    /// the built-in default template is used instead.
    #[serde(default = "default_template_path")]
    pub path: String,

    /// Currency code prefixed to formatted rates.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: default_template_path(),
            currency: default_currency(),
        }
    }
}

fn default_template_path() -> String {
    "templates/ratecard.hbs".into()
}
fn default_currency() -> String {
    "MYR".into()
}

/// `[export]` section — paginated PDF output geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Paper width in inches (A4 default).
    #[serde(default = "default_paper_width_in")]
    pub paper_width_in: f64,

    /// Paper height in inches (A4 default).
    #[serde(default = "default_paper_height_in")]
    pub paper_height_in: f64,

    /// Margin applied to all four sides, in inches.
    #[serde(default = "default_margin_in")]
    pub margin_in: f64,

    /// Render background colors and images.
    #[serde(default = "default_true")]
    pub print_background: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            paper_width_in: default_paper_width_in(),
            paper_height_in: default_paper_height_in(),
            margin_in: default_margin_in(),
            print_background: default_true(),
        }
    }
}

fn default_paper_width_in() -> f64 {
    8.27
}
fn default_paper_height_in() -> f64 {
    11.69
}
fn default_margin_in() -> f64 {
    0.4
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ratedeck/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RatedeckError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ratedeck/ratedeck.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| RatedeckError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| RatedeckError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RatedeckError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RatedeckError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RatedeckError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

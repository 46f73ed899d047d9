//! Media configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Values are layered:
//! stock defaults, then the user's config file, then the environment.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! base_url = "http://localhost:8080"          # Current API origin
//! legacy_origins = ["http://localhost:8080"]  # Old origins still found in records
//!
//! [references]
//! upload_prefixes = ["/uploads/"]     # Paths already in proxied form
//! ephemeral_schemes = ["blob:", "data:"]
//!
//! [crop]
//! max_zoom = 3.0                      # UI zoom ceiling (minimum is always 1)
//!
//! [crop.targets]
//! avatar = [1, 1]                     # width:height per media field
//! banner = [3, 1]
//! post = [16, 9]
//!
//! [output]
//! format = "jpeg"                     # jpeg | png | webp | avif
//! quality = 92                        # 1-100, lossy formats only
//! ```
//!
//! ## Environment
//!
//! `API_BASE_URL`, when set and non-empty, replaces `api.base_url`.
//!
//! Unknown keys are rejected to catch typos early.

use crate::crop::{OutputEncoding, OutputFormat, Quality};
use crate::media::{DEFAULT_API_BASE_URL, is_absolute_origin};
use crate::types::MediaTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding `api.base_url`.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults; a user file only names what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// API origin and the origins it replaced.
    pub api: ApiConfig,
    /// Recognized stored-reference shapes.
    pub references: ReferencesConfig,
    /// Crop aspect ratios and zoom policy.
    pub crop: CropConfig,
    /// Encoded crop format.
    pub output: OutputConfig,
}

impl MediaConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_absolute_origin(self.api.base_url.trim_end_matches('/')) {
            return Err(ConfigError::Validation(format!(
                "api.base_url must be an absolute origin like http://host:port, got '{}'",
                self.api.base_url
            )));
        }
        if let Some(bad) = self
            .api
            .legacy_origins
            .iter()
            .find(|o| !is_absolute_origin(o.trim_end_matches('/')))
        {
            return Err(ConfigError::Validation(format!(
                "api.legacy_origins entries must be absolute origins, got '{bad}'"
            )));
        }
        if let Some(bad) = self
            .references
            .upload_prefixes
            .iter()
            .find(|p| !p.starts_with('/'))
        {
            return Err(ConfigError::Validation(format!(
                "references.upload_prefixes entries must start with '/', got '{bad}'"
            )));
        }
        if self.references.ephemeral_schemes.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::Validation(
                "references.ephemeral_schemes entries must not be empty".into(),
            ));
        }
        if !(self.crop.max_zoom.is_finite() && self.crop.max_zoom >= 1.0) {
            return Err(ConfigError::Validation(
                "crop.max_zoom must be a number >= 1".into(),
            ));
        }
        for target in [MediaTarget::Avatar, MediaTarget::Banner, MediaTarget::Post] {
            let [w, h] = self.crop.targets.ratio(target);
            if w == 0 || h == 0 {
                return Err(ConfigError::Validation(format!(
                    "crop.targets.{target} values must be non-zero"
                )));
            }
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

/// API origin settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Origins stripped from old absolute references. Empty this list once
    /// stored records no longer contain them.
    pub legacy_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            legacy_origins: vec![DEFAULT_API_BASE_URL.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferencesConfig {
    pub upload_prefixes: Vec<String>,
    pub ephemeral_schemes: Vec<String>,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            upload_prefixes: vec!["/uploads/".to_string()],
            ephemeral_schemes: vec!["blob:".to_string(), "data:".to_string()],
        }
    }
}

/// Crop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Zoom ceiling applied by the session. The geometry itself has none.
    pub max_zoom: f64,
    pub targets: TargetsConfig,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_zoom: 3.0,
            targets: TargetsConfig::default(),
        }
    }
}

/// Aspect ratio per media field as `[width, height]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetsConfig {
    pub avatar: [u32; 2],
    pub banner: [u32; 2],
    pub post: [u32; 2],
}

impl TargetsConfig {
    pub fn ratio(&self, target: MediaTarget) -> [u32; 2] {
        match target {
            MediaTarget::Avatar => self.avatar,
            MediaTarget::Banner => self.banner,
            MediaTarget::Post => self.post,
        }
    }
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            avatar: [1, 1],
            banner: [3, 1],
            post: [16, 9],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub quality: u32,
}

impl OutputConfig {
    pub fn encoding(&self) -> OutputEncoding {
        OutputEncoding::new(self.format, Quality::new(self.quality))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: Quality::default().value(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(MediaConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Replace values with their environment overrides.
///
/// Takes a lookup function so tests do not have to touch the process
/// environment.
pub fn apply_env_overrides(
    mut config: MediaConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> MediaConfig {
    if let Some(base_url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
        log::debug!("api.base_url overridden by {API_BASE_URL_ENV}={base_url}");
        config.api.base_url = base_url.trim().to_string();
    }
    config
}

/// Merge, apply environment overrides, deserialize, and validate.
pub fn resolve_config(
    overlay: Option<toml::Value>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<MediaConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MediaConfig = merged.try_into()?;
    let config = apply_env_overrides(config, lookup);
    config.validate()?;
    Ok(config)
}

/// Load config from an optional file plus the process environment.
///
/// A missing file means stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<MediaConfig, ConfigError> {
    let overlay = match path {
        Some(p) => load_raw_config(p)?,
        None => None,
    };
    resolve_config(overlay, |key| std::env::var(key).ok())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# profile-media configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

[api]
# Origin of the backend API. Absolute references under it are rewritten to
# same-origin paths served by the reverse proxy.
# The API_BASE_URL environment variable overrides this value.
base_url = "http://localhost:8080"

# Origins the API used to live at. Records written back then still carry
# absolute URLs under them; those are rewritten the same way.
# Empty this list once the stored data has been migrated.
legacy_origins = ["http://localhost:8080"]

[references]
# Path prefixes that are already in proxied form.
upload_prefixes = ["/uploads/"]

# Scheme markers of in-memory previews. Passed through untouched.
ephemeral_schemes = ["blob:", "data:"]

[crop]
# Largest zoom the crop dialog allows. The minimum is always 1.
max_zoom = 3.0

[crop.targets]
# Aspect ratio of each media field as [width, height].
avatar = [1, 1]
banner = [3, 1]
post = [16, 9]

[output]
# Encoded crop format: jpeg, png, webp (lossless) or avif.
format = "jpeg"

# Encoding quality (1-100). Ignored by png and webp.
quality = 92
"##
}

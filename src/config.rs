//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `imgpool.toml`. Stock defaults are
//! the base layer; a user file overrides any subset of keys; command-line flags
//! override both (applied by the binary, not here).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [processing]
//! workers = 4               # Worker threads (omit for auto = CPU cores)
//!
//! [output]
//! quality = 90              # JPEG quality (1-100)
//!
//! [zoom]
//! out_width = 500           # Output size of a zoomed image
//! out_height = 500
//! center = [0.5, 0.5]       # Focus point as fractions of width/height
//! level = 2.0               # Magnification (> 0; below 1 zooms out)
//!
//! [resize]
//! width = 1280
//! height = 720
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want.
//!
//! ```toml
//! [zoom]
//! level = 3.0
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The worker pool never reads configuration. The binary resolves worker count
//! and operation parameters here and passes them in explicitly.

use crate::imaging::{ParamError, Quality, ResizeParams, ZoomParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "imgpool.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `imgpool.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker pool sizing.
    pub processing: ProcessingConfig,
    /// Encoder settings.
    pub output: OutputConfig,
    /// Default digital zoom parameters.
    pub zoom: ZoomConfig,
    /// Default resize target.
    pub resize: ResizeConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.workers must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        self.zoom
            .params()
            .map_err(|e| ConfigError::Validation(format!("zoom: {e}")))?;
        self.resize
            .params()
            .map_err(|e| ConfigError::Validation(format!("resize: {e}")))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of worker threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub workers: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_workers(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.workers.map(|n| n.min(cores)).unwrap_or(cores).max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

impl OutputConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoomConfig {
    pub out_width: u32,
    pub out_height: u32,
    /// Focus point as `[x, y]` fractions of the source size.
    pub center: [f32; 2],
    pub level: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        let params = ZoomParams::centered();
        let (cx, cy) = params.center();
        Self {
            out_width: params.out_width(),
            out_height: params.out_height(),
            center: [cx, cy],
            level: params.level(),
        }
    }
}

impl ZoomConfig {
    pub fn params(&self) -> Result<ZoomParams, ParamError> {
        ZoomParams::new(
            self.out_width,
            self.out_height,
            self.center[0],
            self.center[1],
            self.level,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl ResizeConfig {
    pub fn params(&self) -> Result<ResizeParams, ParamError> {
        ResizeParams::new(self.width, self.height)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// With `None`, returns the stock defaults. With a path, the file must exist;
/// its values are merged on top of the defaults, unknown keys are rejected, and
/// the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `imgpool.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgpool configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Loaded from ./imgpool.toml, or from the file given with --config.
# Command-line flags override these values.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Number of worker threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# Values above the core count are clamped.
# workers = 4

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best). Other formats are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Digital zoom
# ---------------------------------------------------------------------------
[zoom]
# Size of the zoomed output image in pixels.
out_width = 500
out_height = 500

# Focus point as [x, y] fractions of the source (0.0 = left/top, 1.0 = right/bottom).
center = [0.5, 0.5]

# Magnification. 2.0 shows half the width and height of the source.
# Values below 1.0 zoom out; edge pixels are repeated beyond the source.
level = 2.0

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Target size in pixels (nearest neighbor, aspect ratio is not preserved).
width = 1280
height = 720
"##
}

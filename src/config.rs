use anyhow::{Context, Result};
use serde::Deserialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::audio::analysis::{PATIN_SENSITIVITY_OFFSET, PATIN_VARIANCE_COEFFICIENT};
use crate::audio::spectrum::TransformKind;
use crate::audio::window::WindowType;

pub const LOCAL_CONFIG_NAME: &str = "wavscope.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub beat: BeatConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub tempo: TempoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatConfig {
    /// Duration analyzed per detector step
    #[serde(default = "default_precision_ms")]
    pub precision_ms: u64,
    /// Duration of energy history the threshold looks at
    #[serde(default = "default_buffer_ms")]
    pub buffer_ms: u64,
    #[serde(default = "default_variance_coefficient")]
    pub variance_coefficient: f64,
    #[serde(default = "default_sensitivity_offset")]
    pub sensitivity_offset: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "default_window")]
    pub window: WindowType,
    #[serde(default)]
    pub transform: TransformKind,
    /// Frames per analyzed block; a power of two for the FFT
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TempoConfig {
    #[serde(default = "default_min_bpm")]
    pub min_bpm: u32,
    /// Exclusive
    #[serde(default = "default_max_bpm")]
    pub max_bpm: u32,
    #[serde(default = "default_bpm_step")]
    pub step: u32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            precision_ms: default_precision_ms(),
            buffer_ms: default_buffer_ms(),
            variance_coefficient: default_variance_coefficient(),
            sensitivity_offset: default_sensitivity_offset(),
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            transform: TransformKind::default(),
            block_frames: default_block_frames(),
        }
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            step: default_bpm_step(),
        }
    }
}

impl TempoConfig {
    pub fn range(&self) -> Range<u32> {
        self.min_bpm..self.max_bpm
    }
}

fn default_precision_ms() -> u64 { 75 }
fn default_buffer_ms() -> u64 { 1000 }
fn default_variance_coefficient() -> f64 { PATIN_VARIANCE_COEFFICIENT }
fn default_sensitivity_offset() -> f64 { PATIN_SENSITIVITY_OFFSET }
fn default_window() -> WindowType { WindowType::Hanning }
fn default_block_frames() -> usize { 1024 }
fn default_min_bpm() -> u32 { 60 }
fn default_max_bpm() -> u32 { 200 }
fn default_bpm_step() -> u32 { 1 }

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid wavscope configuration")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = Config::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Local `wavscope.toml` in `dir`, then `~/.config/wavscope/config.toml`,
/// then the platform config directory.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let local = dir.join(LOCAL_CONFIG_NAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("wavscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("wavscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

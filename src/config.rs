// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::info;

/// Runtime configuration, loaded once at startup and passed by reference
/// to every stage. There is no ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub performance: Performance,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    /// Root directory holding one `YYYY-MM` subdirectory per extracted period.
    #[serde(default = "default_extract_path")]
    pub extract_path: PathBuf,
    /// Root directory receiving one `YYYY-MM` subdirectory per transformed period.
    #[serde(default = "default_transformed_path")]
    pub transformed_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    /// Rows per batch when streaming a raw file. Bounds peak memory for
    /// files that can run to tens of millions of rows.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Prompt for the period to process instead of taking the most recent.
    #[serde(default)]
    pub ask_user: bool,
    /// Keep only establishments whose registration status is "02" (ATIVA).
    #[serde(default)]
    pub estabelecimentos_apta_only: bool,
}

fn default_extract_path() -> PathBuf {
    PathBuf::from("data/extracted")
}

fn default_transformed_path() -> PathBuf {
    PathBuf::from("data/transformed")
}

fn default_read_chunk_size() -> usize {
    100_000
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            extract_path: default_extract_path(),
            transformed_path: default_transformed_path(),
        }
    }
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

impl Config {
    /// Parse a YAML config file. Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "no config file found, using defaults");
            Ok(Self::default())
        }
    }
}

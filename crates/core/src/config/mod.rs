use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{artifact::DEFAULT_TITLE, Result};

/// Capacity reserved for a fresh back rip. Enough for a busy frame without
/// reallocating on the per-command path.
pub const DEFAULT_RESERVE_BYTES: usize = 1024 * 1024;

/// Top-level configuration for the ripper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RipperConfig {
    /// Directory dumps are written into.
    pub output_dir: PathBuf,
    pub reserve_bytes: usize,
    /// Title used when the host has no cartridge metadata to offer.
    pub default_title: String,
}

impl Default for RipperConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            reserve_bytes: DEFAULT_RESERVE_BYTES,
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl RipperConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

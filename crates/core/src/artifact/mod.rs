use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::{config::RipperConfig, Result};

/// Name used when the cartridge title yields no usable characters.
pub const DEFAULT_TITLE: &str = "melonrip";

/// Extension given to every dump written by [`FileSink`].
pub const DUMP_EXTENSION: &str = "dump";

/// Cartridge headers store the game title in 12 bytes.
pub const TITLE_LEN: usize = 12;

/// Destination for finished dumps.
pub trait ArtifactSink {
    /// Persists `rip` and returns the name it was stored under.
    fn emit(&mut self, rip: &[u8]) -> Result<String>;
}

/// Reduces a cartridge title to lowercase ASCII letters and digits.
///
/// Only the first [`TITLE_LEN`] characters are considered. Falls back to
/// [`DEFAULT_TITLE`] when nothing survives the filter.
pub fn sanitize_title(raw: &str) -> String {
    let title = filter_title(raw);
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

fn filter_title(raw: &str) -> String {
    raw.chars()
        .take(TITLE_LEN)
        .filter(|c| c.is_ascii_digit() || c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `<title>-<YYYY-MM-DD-HH-MM-SS>-<millis>.dump`
pub fn dump_file_name(title: &str, at: DateTime<Local>) -> String {
    format!(
        "{}-{}-{:03}.{DUMP_EXTENSION}",
        title,
        at.format("%Y-%m-%d-%H-%M-%S"),
        at.timestamp_subsec_millis().min(999)
    )
}

/// Writes each dump to its own timestamped file inside a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    title: String,
    fallback: String,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            title: DEFAULT_TITLE.to_string(),
            fallback: DEFAULT_TITLE.to_string(),
        }
    }

    /// Uses the configured directory and fallback title.
    pub fn from_config(config: &RipperConfig) -> Self {
        let fallback = sanitize_title(&config.default_title);
        Self {
            dir: config.output_dir.clone(),
            title: fallback.clone(),
            fallback,
        }
    }

    /// Updates the title used for subsequent file names. `None` means no
    /// cartridge is inserted.
    pub fn set_title(&mut self, raw: Option<&str>) {
        let title = filter_title(raw.unwrap_or_default());
        self.title = if title.is_empty() {
            self.fallback.clone()
        } else {
            title
        };
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for FileSink {
    fn emit(&mut self, rip: &[u8]) -> Result<String> {
        let name = dump_file_name(&self.title, Local::now());
        let path = self.dir.join(&name);
        std::fs::write(&path, rip)?;
        tracing::info!(path = %path.display(), bytes = rip.len(), "ripped frame");
        Ok(name)
    }
}

/// Keeps finished dumps in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    dumps: Vec<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dumps(&self) -> &[Vec<u8>] {
        &self.dumps
    }

    pub fn take(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.dumps)
    }
}

impl ArtifactSink for MemorySink {
    fn emit(&mut self, rip: &[u8]) -> Result<String> {
        self.dumps.push(rip.to_vec());
        Ok(format!("memory-{}", self.dumps.len() - 1))
    }
}

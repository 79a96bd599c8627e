use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SignkeepError, SignkeepResult};

/// Top-level configuration (loaded from signkeep.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignkeepConfig {
    pub material: MaterialConfig,
    pub kdf: KdfConfig,
    pub log: LogConfig,
}

impl SignkeepConfig {
    /// Load the config from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> SignkeepResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SignkeepError::Config(format!("reading config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| SignkeepError::Config(format!("parsing config {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// On-disk material layout
///
/// The defaults match the layout written by the legacy signing tool. Material
/// created under different folder names is unreadable by other tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Default material root when none is given on the command line
    pub path: Option<PathBuf>,
    /// Folder holding the three share slots (`<share_dir>/0..2`)
    pub share_dir: String,
    /// Folder holding the salt slot
    pub aux_dir: String,
    /// Folder holding the encrypted working key slot
    pub cipher_dir: String,
    /// OS housekeeping files skipped when counting slot contents
    pub ignored_files: Vec<String>,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            path: None,
            share_dir: "fd".into(),
            aux_dir: "ac".into(),
            cipher_dir: "ce".into(),
            ignored_files: vec![".DS_Store".into()],
        }
    }
}

/// Root key derivation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// PBKDF2-HMAC-SHA256 iteration count (default: 10000)
    pub iterations: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self { iterations: 10_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

//! Directory layout of a material root
//!
//! ```text
//! M/<share_dir>/0/<sha256hex(share0)>
//! M/<share_dir>/1/<sha256hex(share1)>
//! M/<share_dir>/2/<sha256hex(share2)>
//! M/<aux_dir>/<sha256hex(salt)>
//! M/<cipher_dir>/<sha256hex(blob)>
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use signkeep_core::config::MaterialConfig;
use signkeep_core::{SignkeepError, SignkeepResult};
use signkeep_crypto::SHARE_COUNT;

/// One of the five single-file slots in a material directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Key share by index (`0..SHARE_COUNT`)
    Share(usize),
    /// PBKDF2 salt
    Aux,
    /// Working key wrapped under the root key
    Cipher,
}

impl Slot {
    /// All slots in creation order.
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SHARE_COUNT)
            .map(Slot::Share)
            .chain([Slot::Aux, Slot::Cipher])
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Share(index) => write!(f, "share[{index}]"),
            Slot::Aux => f.write_str("salt"),
            Slot::Cipher => f.write_str("working key"),
        }
    }
}

/// Folder names and housekeeping-file filter for a material root
#[derive(Debug, Clone)]
pub struct MaterialLayout {
    pub share_dir: String,
    pub aux_dir: String,
    pub cipher_dir: String,
    pub ignored_files: Vec<String>,
}

impl Default for MaterialLayout {
    fn default() -> Self {
        let config = MaterialConfig::default();
        Self {
            share_dir: config.share_dir,
            aux_dir: config.aux_dir,
            cipher_dir: config.cipher_dir,
            ignored_files: config.ignored_files,
        }
    }
}

impl TryFrom<&MaterialConfig> for MaterialLayout {
    type Error = SignkeepError;

    fn try_from(config: &MaterialConfig) -> SignkeepResult<Self> {
        let layout = Self {
            share_dir: config.share_dir.clone(),
            aux_dir: config.aux_dir.clone(),
            cipher_dir: config.cipher_dir.clone(),
            ignored_files: config.ignored_files.clone(),
        };
        layout.validate()?;
        Ok(layout)
    }
}

impl MaterialLayout {
    /// Check that the three folder names are distinct single path components
    /// that stay inside the material root.
    pub fn validate(&self) -> SignkeepResult<()> {
        let names = [
            ("share_dir", &self.share_dir),
            ("aux_dir", &self.aux_dir),
            ("cipher_dir", &self.cipher_dir),
        ];

        for (key, name) in names {
            let mut components = Path::new(name.as_str()).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => {}
                _ => {
                    return Err(SignkeepError::Config(format!(
                        "material.{key} must be a single relative folder name, got {name:?}"
                    )))
                }
            }
        }

        for (i, (key, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(SignkeepError::Config(format!(
                    "material.{key} and material.{other} are both {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// Directory that holds the single file of `slot`.
    pub fn slot_dir(&self, root: &Path, slot: Slot) -> PathBuf {
        match slot {
            Slot::Share(index) => root.join(&self.share_dir).join(index.to_string()),
            Slot::Aux => root.join(&self.aux_dir),
            Slot::Cipher => root.join(&self.cipher_dir),
        }
    }

    /// Every slot directory under `root`, in creation order.
    pub fn slot_dirs(&self, root: &Path) -> Vec<(Slot, PathBuf)> {
        Slot::all()
            .map(|slot| (slot, self.slot_dir(root, slot)))
            .collect()
    }

    /// Whether a directory entry is OS housekeeping and not slot content.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.ignored_files.iter().any(|ignored| ignored == file_name)
    }
}

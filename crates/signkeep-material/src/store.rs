//! Material store: creates and reads the on-disk key material
//!
//! Every file is named by the lowercase hex SHA-256 of its contents and
//! written owner read/write only. Directories are 0755. A material directory
//! is written once and never updated in place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use signkeep_core::{SignkeepError, SignkeepResult};
use signkeep_crypto::{
    aead, derive_root_key, generate_salt, generate_share, generate_working_key, KdfParams,
    KeyShare, Salt, WorkingKey, KEY_SIZE, SHARE_COUNT,
};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::layout::{MaterialLayout, Slot};

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o600;

/// Lowercase hex SHA-256 of `content`, used as its file name.
pub fn content_name(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Reads and writes material directories with a fixed layout and KDF params.
#[derive(Debug, Clone, Default)]
pub struct MaterialStore {
    layout: MaterialLayout,
    kdf: KdfParams,
}

impl MaterialStore {
    pub fn new(layout: MaterialLayout, kdf: KdfParams) -> Self {
        Self { layout, kdf }
    }

    pub fn layout(&self) -> &MaterialLayout {
        &self.layout
    }

    /// Create a complete material directory at `path`.
    ///
    /// The layout is populated in a sibling staging directory and renamed onto
    /// `path` in one step, so `path` is either absent or complete. Returns
    /// `false` when `path` already exists, including when a concurrent writer
    /// installed its material first; the existing material is left untouched.
    pub fn create(&self, path: &Path) -> SignkeepResult<bool> {
        self.layout.validate()?;
        if path.exists() {
            debug!(path = %path.display(), "material already present, not creating");
            return Ok(false);
        }

        let staging = staging_path(path)?;
        if let Some(parent) = staging.parent() {
            fs::create_dir_all(parent)?;
        }
        create_dir(&staging)?;

        if let Err(e) = self.populate(&staging) {
            discard(&staging);
            return Err(e);
        }

        match fs::rename(&staging, path) {
            Ok(()) => {
                info!(path = %path.display(), "created key material");
                Ok(true)
            }
            Err(_) if path.exists() => {
                discard(&staging);
                warn!(path = %path.display(), "material created concurrently, keeping existing");
                Ok(false)
            }
            Err(e) => {
                discard(&staging);
                Err(e.into())
            }
        }
    }

    /// Write every slot under `root`, which must already exist.
    fn populate(&self, root: &Path) -> SignkeepResult<()> {
        for (_, dir) in self.layout.slot_dirs(root) {
            create_dir_all(root, &dir)?;
        }

        let shares = [generate_share(), generate_share(), generate_share()];
        for (index, share) in shares.iter().enumerate() {
            self.write_slot(root, Slot::Share(index), share.as_bytes())?;
        }

        let salt = generate_salt();
        self.write_slot(root, Slot::Aux, salt.as_bytes())?;

        let root_key = derive_root_key(&shares, &salt, &self.kdf)?;
        let working_key = generate_working_key();
        let wrapped = aead::encrypt(root_key.as_bytes(), working_key.as_bytes())?;
        self.write_slot(root, Slot::Cipher, &wrapped)?;

        Ok(())
    }

    /// Recover the working key from the material at `path`.
    ///
    /// Nothing is cached: shares and salt are read, the root key is derived
    /// and the working key unwrapped afresh on every call.
    pub fn load(&self, path: &Path) -> SignkeepResult<WorkingKey> {
        self.layout.validate()?;
        if !path.is_dir() {
            return Err(SignkeepError::NotFound(format!(
                "material directory {}",
                path.display()
            )));
        }

        let shares: [KeyShare; SHARE_COUNT] = [
            self.read_share(path, 0)?,
            self.read_share(path, 1)?,
            self.read_share(path, 2)?,
        ];

        let salt_bytes = self.read_slot(path, Slot::Aux)?;
        let salt = Salt::from_slice(&salt_bytes)
            .ok_or_else(|| wrong_length(Slot::Aux, salt_bytes.len()))?;

        let root_key = derive_root_key(&shares, &salt, &self.kdf)?;

        let wrapped = self.read_slot(path, Slot::Cipher)?;
        let plaintext = aead::decrypt(root_key.as_bytes(), &wrapped).map_err(|e| match e {
            SignkeepError::Malformed(msg) => {
                SignkeepError::Integrity(format!("{}: {msg}", Slot::Cipher))
            }
            other => other,
        })?;

        let working_key = WorkingKey::from_slice(&plaintext)
            .ok_or_else(|| wrong_length(Slot::Cipher, plaintext.len()))?;
        debug!(path = %path.display(), "recovered working key");
        Ok(working_key)
    }

    /// Check that the material at `path` is complete and unwraps cleanly.
    pub fn verify(&self, path: &Path) -> SignkeepResult<()> {
        self.load(path).map(drop)
    }

    fn read_share(&self, root: &Path, index: usize) -> SignkeepResult<KeyShare> {
        let slot = Slot::Share(index);
        let bytes = self.read_slot(root, slot)?;
        KeyShare::from_slice(&bytes).ok_or_else(|| wrong_length(slot, bytes.len()))
    }

    /// Read the single content file of `slot`, skipping housekeeping files.
    fn read_slot(&self, root: &Path, slot: Slot) -> SignkeepResult<Zeroizing<Vec<u8>>> {
        let dir = self.layout.slot_dir(root, slot);
        if !dir.is_dir() {
            return Err(SignkeepError::NotFound(format!(
                "{slot} directory {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if self.layout.is_ignored(&entry.file_name().to_string_lossy()) {
                continue;
            }
            files.push(entry.path());
        }

        let file = match files.as_slice() {
            [file] => file,
            _ => {
                return Err(SignkeepError::Integrity(format!(
                    "{slot} directory {} holds {} files, expected exactly one",
                    dir.display(),
                    files.len()
                )))
            }
        };

        let content = Zeroizing::new(fs::read(file)?);
        let expected = content_name(&content);
        if file.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
            warn!(%slot, file = %file.display(), "file name does not match its content hash");
        }
        Ok(content)
    }

    fn write_slot(&self, root: &Path, slot: Slot, content: &[u8]) -> SignkeepResult<()> {
        let path = self.layout.slot_dir(root, slot).join(content_name(content));
        write_private(&path, content)?;
        debug!(%slot, "wrote slot");
        Ok(())
    }
}

fn wrong_length(slot: Slot, len: usize) -> SignkeepError {
    SignkeepError::Integrity(format!(
        "{slot} is {len} bytes, expected {KEY_SIZE}"
    ))
}

/// `<parent>/.<name>.staging-<random>` next to the final material path.
fn staging_path(path: &Path) -> SignkeepResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        SignkeepError::Malformed(format!("material path has no final component: {}", path.display()))
    })?;
    let staging = format!(
        ".{}.staging-{:08x}",
        name.to_string_lossy(),
        rand::random::<u32>()
    );
    Ok(path.with_file_name(staging))
}

fn discard(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging) {
        warn!(path = %staging.display(), "failed to remove staging directory: {e}");
    }
}

/// Create `dir` and any missing ancestors below `root`, each with `DIR_MODE`.
fn create_dir_all(root: &Path, dir: &Path) -> SignkeepResult<()> {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if !current.is_dir() {
            create_dir(&current)?;
        }
    }
    Ok(())
}

fn create_dir(dir: &Path) -> SignkeepResult<()> {
    fs::create_dir(dir)?;
    set_mode(dir, DIR_MODE)
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> SignkeepResult<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(FILE_MODE)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()?;
    set_mode(path, FILE_MODE)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> SignkeepResult<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> SignkeepResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> SignkeepResult<()> {
    Ok(())
}

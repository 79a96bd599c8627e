//! Key material manager: the surface used by the signing pipeline

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use signkeep_core::{SignkeepConfig, SignkeepError, SignkeepResult};
use signkeep_crypto::{aead, KdfParams};
use tracing::{debug, info};

use crate::layout::MaterialLayout;
use crate::store::MaterialStore;

/// Creates material on demand and encrypts/decrypts signing passwords with
/// the working key it protects.
#[derive(Debug, Clone, Default)]
pub struct KeyMaterialManager {
    store: MaterialStore,
}

impl KeyMaterialManager {
    pub fn new(store: MaterialStore) -> Self {
        Self { store }
    }

    /// Build a manager from the `[material]` and `[kdf]` config sections.
    ///
    /// Fails with [`SignkeepError::Config`] when the folder names would leave
    /// the material root or overlap.
    pub fn from_config(config: &SignkeepConfig) -> SignkeepResult<Self> {
        let layout = MaterialLayout::try_from(&config.material)?;
        let kdf = KdfParams {
            iterations: config.kdf.iterations,
        };
        Ok(Self::new(MaterialStore::new(layout, kdf)))
    }

    pub fn store(&self) -> &MaterialStore {
        &self.store
    }

    /// Create material at `path` unless something already exists there.
    ///
    /// Existing contents are not inspected: a damaged directory surfaces on
    /// the next encrypt or decrypt, or through [`verify`](Self::verify).
    /// Returns whether this call created the material.
    pub fn ensure_material(&self, path: &Path) -> SignkeepResult<bool> {
        if path.exists() {
            debug!(path = %path.display(), "using existing material directory");
            return Ok(false);
        }
        info!(path = %path.display(), "creating material directory");
        self.store.create(path)
    }

    /// Encrypt `password` under the working key and return the blob as hex.
    pub fn encrypt_password(&self, password: &SecretString, path: &Path) -> SignkeepResult<String> {
        let working_key = self.store.load(path)?;
        let blob = aead::encrypt(working_key.as_bytes(), password.expose_secret().as_bytes())?;
        Ok(hex::encode(blob))
    }

    /// Decrypt a hex blob produced by [`encrypt_password`](Self::encrypt_password).
    ///
    /// A tampered blob or foreign material fails with
    /// [`SignkeepError::Authentication`].
    pub fn decrypt_password(&self, hex_blob: &str, path: &Path) -> SignkeepResult<SecretString> {
        let blob = hex::decode(hex_blob.trim())
            .map_err(|e| SignkeepError::Malformed(format!("password blob is not hex: {e}")))?;
        let working_key = self.store.load(path)?;
        let plaintext = aead::decrypt(working_key.as_bytes(), &blob)?;
        let password = std::str::from_utf8(&plaintext).map_err(|_| SignkeepError::InvalidUtf8)?;
        Ok(SecretString::from(password.to_owned()))
    }

    /// Proactively check the material at `path`.
    pub fn verify(&self, path: &Path) -> SignkeepResult<()> {
        self.store.verify(path)
    }
}

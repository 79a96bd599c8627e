//! AES-128-GCM encryption with a self-describing length-prefixed framing
//!
//! Blob format (binary):
//! ```text
//! [4 bytes: len(ciphertext) + 16, big-endian][12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The same framing is used for the wrapped working key on disk and for the
//! password ciphertext handed to callers (hex-encoded).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use rand::RngCore;
use signkeep_core::{SignkeepError, SignkeepResult};
use zeroize::Zeroizing;

use crate::{HEADER_SIZE, KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Total size of the blob produced by [`encrypt`] for a plaintext of the given
/// length.
pub fn blob_len(plaintext_len: usize) -> usize {
    HEADER_SIZE + NONCE_SIZE + plaintext_len + TAG_SIZE
}

/// Encrypt `plaintext` under a 128-bit key with a fresh random nonce.
///
/// Returns: `[4-byte length][12-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> SignkeepResult<Vec<u8>> {
    let cipher = Aes128Gcm::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // aes-gcm appends the tag to the ciphertext, which is the order we frame
    let sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow::anyhow!("AES-128-GCM encryption failed: {e}"))?;

    let declared = u32::try_from(sealed.len()).map_err(|_| {
        SignkeepError::Malformed(format!("plaintext too large to frame: {} bytes", plaintext.len()))
    })?;

    let mut blob = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + sealed.len());
    blob.extend_from_slice(&declared.to_be_bytes());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails with [`SignkeepError::Malformed`] when the framing is inconsistent and
/// with [`SignkeepError::Authentication`] when the tag does not verify. No
/// plaintext is returned unless authentication succeeds.
pub fn decrypt(key: &[u8; KEY_SIZE], blob: &[u8]) -> SignkeepResult<Zeroizing<Vec<u8>>> {
    if blob.len() < HEADER_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(SignkeepError::Malformed(format!(
            "blob too short: {} bytes (minimum {})",
            blob.len(),
            HEADER_SIZE + NONCE_SIZE + TAG_SIZE
        )));
    }

    let (header, rest) = blob.split_at(HEADER_SIZE);
    let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);

    let mut declared = [0u8; HEADER_SIZE];
    declared.copy_from_slice(header);
    let declared = u32::from_be_bytes(declared) as usize;
    if declared != sealed.len() {
        return Err(SignkeepError::Malformed(format!(
            "length header says {declared} bytes of ciphertext and tag, blob carries {}",
            sealed.len()
        )));
    }

    let cipher = Aes128Gcm::new(key.into());
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, sealed)
        .map(Zeroizing::new)
        .map_err(|_| SignkeepError::Authentication)
}

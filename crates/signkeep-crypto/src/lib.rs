//! signkeep-crypto: key material primitives for signing-password protection
//!
//! Key hierarchy:
//! ```text
//! share[0] ^ share[1] ^ share[2] ^ COMPONENT
//!   └── legacy UTF-8 rendering → PBKDF2-HMAC-SHA256(salt, 10000) → Root Key (never stored)
//!         └── AES-128-GCM unwrap of the ciphertext slot → Working Key
//!               └── AES-128-GCM → password blob (hex to callers)
//! ```
//!
//! The in-code constant is public to anyone with the source. Splitting the
//! secret across files guards against partial disk exposure, not full
//! compromise of the material directory plus the binary.

pub mod aead;
pub mod kdf;
pub mod keys;

pub use aead::{blob_len, decrypt, encrypt};
pub use kdf::{derive_root_key, KdfParams};
pub use keys::{generate_salt, generate_share, generate_working_key, KeyShare, RootKey, Salt, WorkingKey};

/// Size of every key, share and salt in bytes (128-bit)
pub const KEY_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the big-endian length header that prefixes every blob
pub const HEADER_SIZE: usize = 4;

/// Number of key shares combined into the root key
pub const SHARE_COUNT: usize = 3;

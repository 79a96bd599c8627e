//! 128-bit secret values: shares, salt, root key and working key

use rand::RngCore;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// Declares a 16-byte secret newtype that is zeroized on drop and redacted in
/// `Debug` output.
macro_rules! secret_bytes {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            bytes: [u8; KEY_SIZE],
        }

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
                Self { bytes }
            }

            /// All-zero value, to be filled in place through
            /// [`as_mut_bytes`](Self::as_mut_bytes).
            pub fn zeroed() -> Self {
                Self { bytes: [0u8; KEY_SIZE] }
            }

            /// Copy from a slice, returning `None` unless it is exactly
            /// `KEY_SIZE` bytes long.
            pub fn from_slice(slice: &[u8]) -> Option<Self> {
                if slice.len() != KEY_SIZE {
                    return None;
                }
                let mut value = Self::zeroed();
                value.bytes.copy_from_slice(slice);
                Some(value)
            }

            pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
                &self.bytes
            }

            pub fn as_mut_bytes(&mut self) -> &mut [u8; KEY_SIZE] {
                &mut self.bytes
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.bytes.zeroize();
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("bytes", &"[REDACTED]")
                    .finish()
            }
        }
    };
}

secret_bytes!(
    /// One of the three random shares combined into the root key.
    KeyShare
);

secret_bytes!(
    /// Random PBKDF2 salt stored in the auxiliary slot.
    Salt
);

secret_bytes!(
    /// Transient key derived from the shares and salt. Never persisted.
    RootKey
);

secret_bytes!(
    /// Key protecting the signing password. Persisted only wrapped under the
    /// root key.
    WorkingKey
);

/// Generate a random key share.
pub fn generate_share() -> KeyShare {
    let mut share = KeyShare::zeroed();
    rand::thread_rng().fill_bytes(share.as_mut_bytes());
    share
}

/// Generate a random salt.
pub fn generate_salt() -> Salt {
    let mut salt = Salt::zeroed();
    rand::thread_rng().fill_bytes(salt.as_mut_bytes());
    salt
}

/// Generate a random working key.
pub fn generate_working_key() -> WorkingKey {
    let mut key = WorkingKey::zeroed();
    rand::thread_rng().fill_bytes(key.as_mut_bytes());
    key
}

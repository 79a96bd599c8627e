//! Root key derivation: XOR of shares + constant → PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use signkeep_core::{SignkeepError, SignkeepResult};
use zeroize::Zeroizing;

use crate::keys::{KeyShare, RootKey, Salt};
use crate::{KEY_SIZE, SHARE_COUNT};

/// Fixed fourth component mixed into every root key.
///
/// Must stay byte-identical for existing material directories to remain
/// readable.
pub const COMPONENT: [u8; KEY_SIZE] = [
    49, 243, 9, 115, 214, 175, 91, 184, 211, 190, 177, 88, 101, 131, 192, 119,
];

/// PBKDF2 parameters for root key derivation
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Iteration count (default: 10000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: 10_000 }
    }
}

/// XOR the three shares and [`COMPONENT`] into one 16-byte value.
pub fn combine_shares(shares: &[KeyShare; SHARE_COUNT]) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut combined = Zeroizing::new(COMPONENT);
    for share in shares {
        for (out, byte) in combined.iter_mut().zip(share.as_bytes()) {
            *out ^= byte;
        }
    }
    combined
}

/// Render the combined value as the PBKDF2 password.
///
/// The legacy tool decoded the bytes as UTF-8, replacing each maximal invalid
/// subsequence with U+FFFD, and fed the re-encoded string to PBKDF2.
/// `from_utf8_lossy` applies the same replacement rule, so the output is
/// bit-for-bit compatible. The mapping is lossy: distinct combined values can
/// collide.
pub fn derivation_input(combined: &[u8; KEY_SIZE]) -> Zeroizing<String> {
    Zeroizing::new(String::from_utf8_lossy(combined).into_owned())
}

/// Derive the root key from the three shares and the salt.
///
/// Deterministic: identical shares, salt and params always yield the same key.
pub fn derive_root_key(
    shares: &[KeyShare; SHARE_COUNT],
    salt: &Salt,
    params: &KdfParams,
) -> SignkeepResult<RootKey> {
    if params.iterations == 0 {
        return Err(SignkeepError::Config(
            "PBKDF2 iteration count must be non-zero".into(),
        ));
    }

    let combined = combine_shares(shares);
    let password = derivation_input(&combined);

    // Derived straight into the key so no unzeroized copy is left behind
    let mut key = RootKey::zeroed();
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        key.as_mut_bytes(),
    );

    tracing::trace!(iterations = params.iterations, "derived root key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_hex(s: &str) -> [u8; KEY_SIZE] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    fn shares(a: [u8; KEY_SIZE], b: [u8; KEY_SIZE], c: [u8; KEY_SIZE]) -> [KeyShare; SHARE_COUNT] {
        [
            KeyShare::from_bytes(a),
            KeyShare::from_bytes(b),
            KeyShare::from_bytes(c),
        ]
    }

    #[test]
    fn test_zero_shares_combine_to_component() {
        let combined = combine_shares(&shares([0; KEY_SIZE], [0; KEY_SIZE], [0; KEY_SIZE]));
        assert_eq!(*combined, COMPONENT);
    }

    #[test]
    fn test_share_order_does_not_matter() {
        let a = [0x01u8; KEY_SIZE];
        let b = [0x5Au8; KEY_SIZE];
        let c = [0xC3u8; KEY_SIZE];
        assert_eq!(
            *combine_shares(&shares(a, b, c)),
            *combine_shares(&shares(c, a, b))
        );
    }

    #[test]
    fn test_derivation_input_replaces_invalid_sequences() {
        // 0xF3 starts a 4-byte sequence that 0x09 breaks; 0xB8, 0xB1, 0x83 are
        // stray continuation bytes; 0xC0 is never valid.
        let input = derivation_input(&COMPONENT);
        assert_eq!(
            hex::encode(input.as_bytes()),
            "31efbfbd0973d6af5befbfbdd3beefbfbd5865efbfbdefbfbd77"
        );
    }

    #[test]
    fn test_derivation_input_keeps_ascii() {
        let input = derivation_input(b"signing-key-0001");
        assert_eq!(input.as_str(), "signing-key-0001");
    }

    // Known-answer vectors from the legacy Node.js signing tool.

    #[test]
    fn test_legacy_vector_zero_shares() {
        let root = derive_root_key(
            &shares([0; KEY_SIZE], [0; KEY_SIZE], [0; KEY_SIZE]),
            &Salt::from_bytes([0x11; KEY_SIZE]),
            &KdfParams::default(),
        )
        .unwrap();
        assert_eq!(root.as_bytes(), &from_hex("6f12b44e104f5bc938d807657668a528"));
    }

    #[test]
    fn test_legacy_vector_mixed_shares() {
        let root = derive_root_key(
            &shares(
                from_hex("000102030405060708090a0b0c0d0e0f"),
                from_hex("f0e1d2c3b4a5968778695a4b3c2d1e0f"),
                from_hex("5555555555555555aaaaaaaaaaaaaaaa"),
            ),
            &Salt::from_bytes(from_hex("a1a2a3a4a5a6a7a8a9aaabacadaeafb0")),
            &KdfParams::default(),
        )
        .unwrap();
        assert_eq!(root.as_bytes(), &from_hex("f79f0c85e56f99877f49b00dac0e2c0d"));
    }

    #[test]
    fn test_legacy_vector_ascii_combination() {
        // share[2] chosen so the combined value reads "signing-key-0001"
        let root = derive_root_key(
            &shares(
                [0; KEY_SIZE],
                [0; KEY_SIZE],
                from_hex("429a6e1dbfc13c95b8dbc87555b3f046"),
            ),
            &Salt::from_bytes([0x22; KEY_SIZE]),
            &KdfParams::default(),
        )
        .unwrap();
        assert_eq!(root.as_bytes(), &from_hex("e87e368773d8d2bad134d40817bdd5ff"));
    }

    #[test]
    fn test_different_salts_different_keys() {
        let s = shares([1; KEY_SIZE], [2; KEY_SIZE], [3; KEY_SIZE]);
        let params = KdfParams { iterations: 100 };

        let key1 = derive_root_key(&s, &Salt::from_bytes([1; KEY_SIZE]), &params).unwrap();
        let key2 = derive_root_key(&s, &Salt::from_bytes([2; KEY_SIZE]), &params).unwrap();

        assert_ne!(
            key1.as_bytes(),
            key2.as_bytes(),
            "different salts must produce different keys"
        );
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = derive_root_key(
            &shares([0; KEY_SIZE], [0; KEY_SIZE], [0; KEY_SIZE]),
            &Salt::from_bytes([0; KEY_SIZE]),
            &KdfParams { iterations: 0 },
        )
        .unwrap_err();
        assert!(matches!(err, SignkeepError::Config(_)));
    }
}

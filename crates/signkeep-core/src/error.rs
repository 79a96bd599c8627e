use thiserror::Error;

pub type SignkeepResult<T> = Result<T, SignkeepError>;

#[derive(Debug, Error)]
pub enum SignkeepError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("authentication failed: wrong key or tampered data")]
    Authentication,

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SignkeepError {
    /// True when an AEAD tag failed to verify.
    ///
    /// Distinguishes tampered or wrong-key material from a miscounted slot.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SignkeepError::Authentication)
    }
}

use thiserror::Error;

/**
    Errors produced by key loading and authenticated encryption/decryption.
*/
#[derive(Debug, Error)]
pub enum CryptoError {
    // ── key loading ────────────────────────────────────────────────────
    #[error("key material is too short: got {0} bytes, need {KEY_LEN}", KEY_LEN = crate::KEY_LEN)]
    KeyTooShort(usize),
    #[error("key file has unsafe permissions {0:o}, expected 0600 or 0400")]
    KeyPermissions(u32),
    #[error("invalid base64 in key file: {0}")]
    KeyBase64(String),

    // ── record decoding ───────────────────────────────────────────────
    #[error("ciphertext record too short: got {0} bytes, need at least {MIN}", MIN = crate::MIN_RECORD_LEN)]
    RecordTooShort(usize),
    #[error("ciphertext length is not a multiple of the block size")]
    RecordMisaligned,
    #[error("MAC verification failed")]
    InvalidSignature,
    #[error("invalid base64 in ciphertext text: {0}")]
    TextBase64(String),

    // ── io ────────────────────────────────────────────────────────────
    #[error("key file io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("public key not authorized")]
    Unauthorized,
    #[error("fetching authorized-keys URL: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("decoding authorized-keys JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parsing authorized-keys line: {0}")]
    KeyParse(String),
    #[error("reader-key store: {0}")]
    Store(#[from] envgate_store::StoreError),
    #[error("reader-key encryption: {0}")]
    Crypto(#[from] envgate_crypto::CryptoError),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

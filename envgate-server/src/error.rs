use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ssh transport error: {0}")]
    Ssh(#[from] russh::Error),
    #[error("key material error: {0}")]
    Crypto(#[from] envgate_crypto::CryptoError),
    #[error("authorization error: {0}")]
    Auth(#[from] envgate_auth::AuthError),
    #[error("store error: {0}")]
    Store(#[from] envgate_store::StoreError),
    #[error("host key io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("host key error: {0}")]
    HostKey(String),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

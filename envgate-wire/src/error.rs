use thiserror::Error;

/**
    Errors produced while decoding request payloads off the wire.
*/
#[derive(Debug, Error)]
pub enum WireError {
    #[error("length prefix claims {0} bytes but only {1} remain")]
    ShortPayload(u32, usize),
}

pub type WireResult<T> = std::result::Result<T, WireError>;

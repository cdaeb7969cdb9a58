/*!
    Length-prefixed message framing for the request/response boundary.

    A string vector is a sequence of records, each a big-endian `u32` length
    followed by that many payload octets. Decoding stops as soon as fewer
    than 4 octets remain — a trailing short suffix is ignored by design,
    not an error. A length prefix followed by insufficient bytes, on the
    other hand, is a hard failure: the sender promised more than it sent.
*/

mod error;

pub use error::{WireError, WireResult};

const LEN_PREFIX: usize = 4;

/**
    Pack a sequence of strings into the wire format: `len(4) || bytes`,
    repeated once per string.
*/
pub fn pack_string_vec<S: AsRef<str>>(strings: &[S]) -> Vec<u8> {
    let mut buf = Vec::new();
    for s in strings {
        let bytes = s.as_ref().as_bytes();
        buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(bytes);
    }
    buf
}

/**
    Unpack a sequence of length-prefixed strings. Stops reading as soon as
    fewer than 4 bytes remain; a length prefix promising more bytes than
    are left in the message is a [`WireError::ShortPayload`].
*/
pub fn unpack_string_vec(message: &[u8]) -> WireResult<Vec<String>> {
    let mut strings = Vec::new();
    let mut offset = 0;

    while message.len() - offset >= LEN_PREFIX {
        let len_bytes: [u8; 4] = message[offset..offset + LEN_PREFIX]
            .try_into()
            .expect("slice is exactly LEN_PREFIX by construction");
        let len = u32::from_be_bytes(len_bytes) as usize;
        offset += LEN_PREFIX;

        let remaining = message.len() - offset;
        if remaining < len {
            return Err(WireError::ShortPayload(len as u32, remaining));
        }

        let payload = &message[offset..offset + len];
        strings.push(String::from_utf8_lossy(payload).into_owned());
        offset += len;
    }

    Ok(strings)
}

/**
    Encode an exit-status channel request payload: a big-endian `u32`,
    `0` for success or `1` for failure.
*/
pub fn encode_exit_status(success: bool) -> [u8; 4] {
    let status: u32 = if success { 0 } else { 1 };
    status.to_be_bytes()
}

/**
    Decode an exit-status payload. Any nonzero value is treated as failure.
*/
pub fn decode_exit_status(payload: &[u8]) -> WireResult<bool> {
    if payload.len() < 4 {
        return Err(WireError::ShortPayload(4, payload.len()));
    }
    let bytes: [u8; 4] = payload[..4]
        .try_into()
        .expect("slice is exactly 4 bytes by construction");
    Ok(u32::from_be_bytes(bytes) == 0)
}

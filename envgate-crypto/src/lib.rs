/*!
    Authenticated encryption for stored secrets.

    A ciphertext record is `tag (64 bytes) || iv (16 bytes) || ciphertext`,
    where `ciphertext` is AES-256-CBC over the plaintext zero-padded to a
    block boundary, and `tag` is HMAC-SHA-512 over `iv || ciphertext`.
    Padding is plain trailing zero bytes rather than PKCS#7: this is a
    deliberate, load-bearing choice preserved for wire compatibility with
    already-stored records, not an oversight (see `cipher::pad_zero`).
*/

mod cipher;
mod error;
mod key;
mod record;

pub use error::{CryptoError, CryptoResult};
pub use key::Key;
pub use record::Cryptor;

/// HMAC-SHA-512 tag length, in bytes.
pub const MAC_TAG_LEN: usize = 64;
/// AES-CBC IV length, in bytes.
pub const IV_LEN: usize = 16;
/// MAC key length, in bytes.
pub const MAC_KEY_LEN: usize = 128;
/// AES-256 key length, in bytes.
pub const CIPHER_KEY_LEN: usize = 32;
/// Total key-file length, in bytes.
pub const KEY_LEN: usize = MAC_KEY_LEN + CIPHER_KEY_LEN;
/// Minimum valid ciphertext record length (tag + iv, zero-length payload).
pub const MIN_RECORD_LEN: usize = MAC_TAG_LEN + IV_LEN;

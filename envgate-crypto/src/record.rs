use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;

use crate::cipher::{cbc_decrypt, cbc_encrypt, pad_zero, unpad_zero};
use crate::error::{CryptoError, CryptoResult};
use crate::key::Key;
use crate::{IV_LEN, MAC_TAG_LEN, MIN_RECORD_LEN};

type HmacSha512 = Hmac<Sha512>;

/**
    Holds a loaded [`Key`] and performs encrypt-then-MAC over it. Immutable
    after construction; safe to share behind an `Arc` across tasks.
*/
pub struct Cryptor {
    key: Key,
}

impl Cryptor {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    /**
        Encrypt `plaintext`, returning `tag || iv || ciphertext`.
    */
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);

        let padded = pad_zero(plaintext);
        let ciphertext = cbc_encrypt(self.key.cipher_key(), &iv, &padded);

        let mut mac = HmacSha512::new_from_slice(self.key.mac_key())
            .expect("HMAC accepts keys of any length");
        mac.update(&iv);
        mac.update(&ciphertext);
        let tag = mac.finalize().into_bytes();

        let mut record = Vec::with_capacity(MAC_TAG_LEN + IV_LEN + ciphertext.len());
        record.extend_from_slice(&tag);
        record.extend_from_slice(&iv);
        record.extend_from_slice(&ciphertext);
        Ok(record)
    }

    /**
        Verify and decrypt a record produced by [`Cryptor::encrypt`].
    */
    pub fn decrypt(&self, record: &[u8]) -> CryptoResult<Vec<u8>> {
        if record.len() < MIN_RECORD_LEN {
            return Err(CryptoError::RecordTooShort(record.len()));
        }
        if (record.len() - MIN_RECORD_LEN) % 16 != 0 {
            return Err(CryptoError::RecordMisaligned);
        }

        let tag = &record[..MAC_TAG_LEN];
        let iv_and_ciphertext = &record[MAC_TAG_LEN..];
        let iv: &[u8; IV_LEN] = iv_and_ciphertext[..IV_LEN]
            .try_into()
            .expect("slice is exactly IV_LEN by construction");
        let ciphertext = &iv_and_ciphertext[IV_LEN..];

        let mut mac = HmacSha512::new_from_slice(self.key.mac_key())
            .expect("HMAC accepts keys of any length");
        mac.update(iv_and_ciphertext);
        mac.verify_slice(tag)
            .map_err(|_| CryptoError::InvalidSignature)?;

        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }

        let padded = cbc_decrypt(self.key.cipher_key(), iv, ciphertext);
        Ok(unpad_zero(&padded))
    }

    /**
        Encrypt and base64-encode, for storage or transmission as text.
    */
    pub fn encrypt_string(&self, plaintext: &str) -> CryptoResult<String> {
        let record = self.encrypt(plaintext.as_bytes())?;
        Ok(BASE64.encode(&record))
    }

    /**
        Base64-decode and decrypt text produced by [`Cryptor::encrypt_string`].
    */
    pub fn decrypt_string(&self, text: &str) -> CryptoResult<String> {
        let record = BASE64
            .decode(text.as_bytes())
            .map_err(|e| CryptoError::TextBase64(e.to_string()))?;
        let plaintext = self.decrypt(&record)?;
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }
}

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

const BLOCK_LEN: usize = 16;

/**
    AES-256-CBC encryption. `key` is 32 bytes, `iv` is 16 bytes, `plaintext`
    must already be padded to a multiple of 16 bytes (see `pad_zero`).
*/
pub fn cbc_encrypt(key: &[u8; 32], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    assert!(
        plaintext.len().is_multiple_of(BLOCK_LEN),
        "plaintext must be pre-padded to the AES block size"
    );

    let cipher = Aes256::new(key.into());
    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut prev = *iv;

    for chunk in plaintext.chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        for i in 0..BLOCK_LEN {
            block[i] = chunk[i] ^ prev[i];
        }
        let mut block_ga = GenericArray::from(block);
        cipher.encrypt_block(&mut block_ga);
        prev.copy_from_slice(&block_ga);
        ciphertext.extend_from_slice(&block_ga);
    }

    ciphertext
}

/**
    AES-256-CBC decryption. `ciphertext` must be non-empty and a multiple of
    16 bytes; callers are expected to have already validated this via the
    record layout before calling in.
*/
pub fn cbc_decrypt(key: &[u8; 32], iv: &[u8; 16], ciphertext: &[u8]) -> Vec<u8> {
    debug_assert!(!ciphertext.is_empty() && ciphertext.len().is_multiple_of(BLOCK_LEN));

    let cipher = Aes256::new(key.into());
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev = *iv;

    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let saved: [u8; BLOCK_LEN] = chunk.try_into().expect("chunks_exact(16) yields 16 bytes");
        let mut block = *GenericArray::from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for i in 0..BLOCK_LEN {
            plaintext.push(block[i] ^ prev[i]);
        }
        prev = saved;
    }

    plaintext
}

/**
    Pad with trailing zero octets up to the next multiple of 16. Not
    PKCS#7 — zero padding is load-bearing for wire compatibility (see the
    crate's top-level documentation).
*/
pub fn pad_zero(plaintext: &[u8]) -> Vec<u8> {
    let remainder = plaintext.len() % BLOCK_LEN;
    let mut padded = plaintext.to_vec();
    if remainder != 0 {
        padded.resize(plaintext.len() + (BLOCK_LEN - remainder), 0);
    }
    padded
}

/**
    Strip trailing zero octets. Ambiguous for plaintexts that legitimately
    end in zero bytes; accepted per the wire format this mirrors.
*/
pub fn unpad_zero(padded: &[u8]) -> Vec<u8> {
    let trimmed = padded
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    padded[..trimmed].to_vec()
}

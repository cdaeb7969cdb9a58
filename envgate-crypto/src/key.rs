use std::io::Read;
use std::path::Path;

use data_encoding::BASE64;

use crate::error::{CryptoError, CryptoResult};
use crate::{CIPHER_KEY_LEN, KEY_LEN, MAC_KEY_LEN};

/**
    The 160-octet dual-purpose key: a 128-octet HMAC key followed by a
    32-octet AES-256 key. Loaded once at startup and held for the life of
    the process.
*/
#[derive(Clone)]
pub struct Key {
    bytes: Vec<u8>,
}

impl Key {
    /**
        Build a key from exactly `KEY_LEN` raw octets.
    */
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> CryptoResult<Self> {
        let bytes = bytes.into();
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::KeyTooShort(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /**
        Read `KEY_LEN` raw octets from any reader (e.g. an OS RNG).
    */
    pub fn from_reader(mut reader: impl Read) -> CryptoResult<Self> {
        let mut bytes = vec![0u8; KEY_LEN];
        reader.read_exact(&mut bytes)?;
        Ok(Self { bytes })
    }

    /**
        Generate a fresh random key from the OS RNG.
    */
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = vec![0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /**
        Load a key from a base64-encoded file, refusing any mode other than
        owner-read (0600) or owner-read-only (0400).
    */
    pub fn from_file(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 && mode != 0o400 {
                return Err(CryptoError::KeyPermissions(mode));
            }
        }

        let encoded = std::fs::read_to_string(path)?;
        let bytes = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|e| CryptoError::KeyBase64(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /**
        Write the key base64-encoded to `path`, creating the file with mode
        0600 before any content is written.
    */
    pub fn to_file(&self, path: impl AsRef<Path>) -> CryptoResult<()> {
        let path = path.as_ref();
        let mut open_options = std::fs::OpenOptions::new();
        open_options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            open_options.mode(0o600);
        }

        let mut file = open_options.open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        use std::io::Write;
        file.write_all(BASE64.encode(&self.bytes).as_bytes())?;
        Ok(())
    }

    pub fn mac_key(&self) -> &[u8] {
        &self.bytes[..MAC_KEY_LEN]
    }

    pub fn cipher_key(&self) -> &[u8; CIPHER_KEY_LEN] {
        self.bytes[MAC_KEY_LEN..]
            .try_into()
            .expect("cipher key slice is exactly CIPHER_KEY_LEN by construction")
    }
}

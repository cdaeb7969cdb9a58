use std::time::Duration;

use russh_keys::PublicKeyBase64;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Response-header timeout for the bootstrap HTTP GET: a one-minute
/// allowance for a slow authorized-keys endpoint.
const RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct RawKey {
    key: String,
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(1)
        .timeout(RESPONSE_HEADER_TIMEOUT)
        .build()
        .expect("static reqwest client configuration is always valid")
}

/**
    Fetch the JSON array of OpenSSH authorized-keys lines at `url` and
    return their SSH wire encodings. A non-200 response, malformed JSON,
    or a line that fails to parse as a public key is a fatal startup
    error.
*/
pub async fn fetch_public_keys(url: &str) -> AuthResult<Vec<Vec<u8>>> {
    let client = build_client();
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    let raw_keys: Vec<RawKey> = serde_json::from_str(&body)?;

    let mut keys = Vec::with_capacity(raw_keys.len());
    for raw in raw_keys {
        keys.push(parse_authorized_key_line(&raw.key)?);
    }
    Ok(keys)
}

/**
    Parse a single OpenSSH authorized-keys line (`<type> <base64> [comment]`)
    into its SSH wire encoding.
*/
pub fn parse_authorized_key_line(line: &str) -> AuthResult<Vec<u8>> {
    let base64_blob = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::KeyParse(format!("missing base64 field in {line:?}")))?;

    let key = russh_keys::parse_public_key_base64(base64_blob)
        .map_err(|e| AuthError::KeyParse(e.to_string()))?;

    Ok(key.public_key_bytes())
}

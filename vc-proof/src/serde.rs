use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::DeserializeOwned, Serialize};

/// Helper trait to encode structs as base64 as part of creating a JWT
pub trait Base64Encode: Serialize {
    fn jwt_base64_encode(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }
}

impl<T> Base64Encode for T where T: Serialize {}

/// Decode one base64url JWT segment into a JSON-deserializable value
pub fn jwt_base64_decode<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|error| anyhow!(error))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Encode raw bytes (signatures) as base64url without padding
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn base64url_decode(segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|error| anyhow!(error))
}

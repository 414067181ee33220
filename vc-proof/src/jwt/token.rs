use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::JwtError;
use crate::{
    crypto::KeyMaterial,
    serde::{base64url_decode, base64url_encode, jwt_base64_decode, Base64Encode},
};

pub const JWT_TYPE: &str = "JWT";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwtHeader {
    pub fn new(alg: &str) -> Self {
        JwtHeader {
            alg: alg.to_owned(),
            typ: Some(JWT_TYPE.to_owned()),
            kid: None,
            extra: Map::new(),
        }
    }

    /// Overlay caller-supplied header fields. Known fields must be strings.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Result<Self> {
        for (name, value) in fields {
            match name.as_str() {
                "alg" | "typ" | "kid" => {
                    let value = value.as_str().map(str::to_owned).ok_or_else(|| {
                        JwtError::InvalidArgument(format!("JWT header {name} must be a string"))
                    })?;
                    match name.as_str() {
                        "alg" => self.alg = value,
                        "typ" => self.typ = Some(value),
                        _ => self.kid = Some(value),
                    }
                }
                _ => {
                    self.extra.insert(name, value);
                }
            }
        }
        Ok(self)
    }
}

/// A compact-serialized JWS whose claims are an arbitrary JSON object
#[derive(Clone, Debug)]
pub struct Jwt {
    header: JwtHeader,
    payload: Map<String, Value>,
    signed_data: Vec<u8>,
    signature: Vec<u8>,
}

impl Jwt {
    /// Sign `payload` with the issuer key under the given header
    pub async fn sign(
        header: JwtHeader,
        payload: Map<String, Value>,
        issuer: &dyn KeyMaterial,
    ) -> Result<Jwt> {
        let header_base64 = header.jwt_base64_encode()?;
        let payload_base64 = payload.jwt_base64_encode()?;

        let data_to_sign = format!("{header_base64}.{payload_base64}")
            .as_bytes()
            .to_vec();
        let signature = issuer.sign(data_to_sign.as_slice()).await?;

        Ok(Jwt {
            header,
            payload,
            signed_data: data_to_sign,
            signature,
        })
    }

    pub fn encode(&self) -> Result<String> {
        let signed_data = std::str::from_utf8(&self.signed_data)?;
        Ok(format!(
            "{signed_data}.{}",
            base64url_encode(&self.signature)
        ))
    }

    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Raw bytes the signature covers: `<header>.<payload>`
    pub fn signed_data(&self) -> &[u8] {
        &self.signed_data
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn issuer(&self) -> Option<&str> {
        self.payload.get("iss").and_then(Value::as_str)
    }
}

impl FromStr for Jwt {
    type Err = anyhow::Error;

    fn from_str(jwt: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = jwt.split('.').collect();
        let (header, payload, signature) = match parts[..] {
            [header, payload, signature] => (header, payload, signature),
            _ => return Err(anyhow!(JwtError::InvalidJwt("Incorrect format JWT".into()))),
        };

        let invalid = |segment: &str, error: anyhow::Error| {
            anyhow!(JwtError::InvalidJwt(format!(
                "Could not decode JWT {segment}: {error}"
            )))
        };

        Ok(Jwt {
            header: jwt_base64_decode(header).map_err(|error| invalid("header", error))?,
            payload: jwt_base64_decode(payload).map_err(|error| invalid("payload", error))?,
            signed_data: format!("{header}.{payload}").as_bytes().to_vec(),
            signature: base64url_decode(signature)
                .map_err(|error| invalid("signature", error))?,
        })
    }
}

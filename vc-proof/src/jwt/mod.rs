//! Signed-token (JWT) issuance and verification of credentials and
//! presentations issued by DIDs

mod service;
mod token;

pub use service::{DidJwtVc, DEFAULT_SKEW_SECONDS};
pub use token::{Jwt, JwtHeader, JWT_TYPE};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::{
    credential::{CredentialPayload, PresentationPayload},
    crypto::{
        ed25519::EDDSA_ALGORITHM,
        secp256k1::{ES256K_ALGORITHM, ES256K_R_ALGORITHM},
        KeyMaterial,
    },
    did::{DidDocument, VerificationMethod},
    resolver::DidResolver,
};

/// The proof type recorded on normalized credentials and presentations
pub const JWT_PROOF_TYPE: &str = "JwtProof2020";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("invalid_argument: {0}")]
    InvalidArgument(String),
    #[error("invalid_jwt: {0}")]
    InvalidJwt(String),
    #[error("invalid_signature: {0}")]
    InvalidSignature(String),
    #[error("resolver_error: {0}")]
    ResolverError(String),
    #[error("no_suitable_keys: {0}")]
    NoSuitableKeys(String),
    #[error("not_supported: {0}")]
    NotSupported(String),
    #[error("invalid_config: {0}")]
    InvalidConfig(String),
    #[error("invalid_audience: {0}")]
    InvalidAudience(String),
}

/// JWS algorithms that can be verified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum Algorithm {
    #[strum(to_string = "EdDSA", serialize = "Ed25519")]
    EdDSA,
    #[strum(to_string = "ES256K")]
    ES256K,
    #[strum(to_string = "ES256K-R")]
    ES256KR,
}

impl Algorithm {
    /// Whether a key that signs with `key_algorithm` can have produced a
    /// signature of this algorithm
    pub fn accepts(&self, key_algorithm: &str) -> bool {
        match self {
            Algorithm::EdDSA => key_algorithm == EDDSA_ALGORITHM,
            Algorithm::ES256K => key_algorithm == ES256K_ALGORITHM,
            Algorithm::ES256KR => {
                key_algorithm == ES256K_ALGORITHM || key_algorithm == ES256K_R_ALGORITHM
            }
        }
    }
}

/// Options for issuing a credential or presentation JWT
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOptions {
    /// Header fields; these take precedence over computed ones such as `kid`
    pub header: Map<String, Value>,
    /// Issued-at claim. No `iat` is added unless set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Seconds from `nbf` (or `iat`, or now) until expiry, unless the payload
    /// already carries `exp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Presentations only: becomes the `nonce` claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Presentations only: added to the `aud` claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Toggles for individual verification checks. Every check is on unless
/// set to `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyPolicies {
    /// Verify time claims against this instant (seconds) instead of the clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<bool>,
    /// Validate the shape of the embedded `vc`/`vp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyOptions {
    /// The audience this verifier answers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<VerifyPolicies>,
    /// Tolerated clock skew in seconds, [`DEFAULT_SKEW_SECONDS`] if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_time: Option<u64>,
    /// Presentations only: expected `nonce`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Presentations only: expected member of `aud`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl VerifyOptions {
    /// Overlay `overrides` on these options. Every key set in `overrides`
    /// wins; `policies` is replaced as a whole.
    pub fn merge(&self, overrides: &VerifyOptions) -> VerifyOptions {
        VerifyOptions {
            audience: overrides.audience.clone().or_else(|| self.audience.clone()),
            policies: overrides.policies.clone().or_else(|| self.policies.clone()),
            skew_time: overrides.skew_time.or(self.skew_time),
            challenge: overrides.challenge.clone().or_else(|| self.challenge.clone()),
            domain: overrides.domain.clone().or_else(|| self.domain.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCredential {
    pub verified: bool,
    pub payload: Map<String, Value>,
    pub did_resolution_result: DidDocument,
    pub issuer: String,
    pub signer: VerificationMethod,
    pub jwt: String,
    pub policies: VerifyPolicies,
    pub verifiable_credential: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPresentation {
    pub verified: bool,
    pub payload: Map<String, Value>,
    pub did_resolution_result: DidDocument,
    pub issuer: String,
    pub signer: VerificationMethod,
    pub jwt: String,
    pub policies: VerifyPolicies,
    pub verifiable_presentation: Value,
}

/// Signs and verifies credential and presentation JWTs. Each operation
/// exists once per object shape.
#[async_trait]
pub trait JwtVc: Send + Sync {
    async fn create_credential_jwt(
        &self,
        payload: &CredentialPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String>;

    async fn create_presentation_jwt(
        &self,
        payload: &PresentationPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String>;

    async fn verify_credential(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedCredential>;

    async fn verify_presentation(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedPresentation>;
}

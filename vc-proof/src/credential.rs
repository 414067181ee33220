//! Credential and presentation payloads, in either their W3C or their JWT
//! claim shape. Fields this crate does not interpret are kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const DEFAULT_VC_TYPE: &str = "VerifiableCredential";
pub const DEFAULT_VP_TYPE: &str = "VerifiablePresentation";

/// Who issued a credential: either a bare DID or an object with an `id`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuerRef {
    Did(String),
    Object {
        id: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl IssuerRef {
    pub fn id(&self) -> &str {
        match self {
            IssuerRef::Did(did) => did,
            IssuerRef::Object { id, .. } => id,
        }
    }
}

impl From<&str> for IssuerRef {
    fn from(did: &str) -> Self {
        IssuerRef::Did(did.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<IssuerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vc: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialPayload {
    /// The issuer the credential names for itself: `iss`, else `issuer`
    pub fn issuer_did(&self) -> Option<&str> {
        self.iss
            .as_deref()
            .or_else(|| self.issuer.as_ref().map(IssuerRef::id))
            .filter(|did| !did.is_empty())
    }

    /// `credentialSubject.id` of a W3C shaped credential
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject
            .as_ref()
            .and_then(|subject| subject.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// The `credentialStatus` of the credential, in either shape
    pub fn status(&self) -> Option<CredentialStatus> {
        match &self.credential_status {
            Some(status) => Some(status.clone()),
            None => self
                .vc
                .as_ref()
                .and_then(|vc| vc.get("credentialStatus"))
                .and_then(|status| serde_json::from_value(status.clone()).ok()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationPayload {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vp: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PresentationPayload {
    /// The presenter the presentation names for itself: `iss`, else `holder`
    pub fn issuer_did(&self) -> Option<&str> {
        self.iss
            .as_deref()
            .or(self.holder.as_deref())
            .filter(|did| !did.is_empty())
    }
}

//! DID documents, as far as verification needs them

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

pub const ED25519_VERIFICATION_KEY_2018: &str = "Ed25519VerificationKey2018";
pub const ED25519_VERIFICATION_KEY_2020: &str = "Ed25519VerificationKey2020";
pub const ECDSA_SECP256K1_VERIFICATION_KEY_2019: &str = "EcdsaSecp256k1VerificationKey2019";
pub const ECDSA_SECP256K1_RECOVERY_METHOD_2020: &str = "EcdsaSecp256k1RecoveryMethod2020";
pub const MULTIKEY: &str = "Multikey";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<VerificationRelationship>,
}

impl DidDocument {
    /// Every verification method the document publishes, whether listed in
    /// `verificationMethod` or embedded in a relationship. Ids are unique in
    /// the result.
    pub fn verification_methods(&self) -> Vec<&VerificationMethod> {
        let embedded = self
            .authentication
            .iter()
            .chain(self.assertion_method.iter())
            .filter_map(|relationship| match relationship {
                VerificationRelationship::Embedded(method) => Some(method),
                VerificationRelationship::Reference(_) => None,
            });

        let mut methods: Vec<&VerificationMethod> = Vec::new();
        for method in self.verification_method.iter().chain(embedded) {
            if !methods.iter().any(|known| known.id == method.id) {
                methods.push(method);
            }
        }
        methods
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationRelationship {
    Reference(String),
    Embedded(VerificationMethod),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,
}

/// Split a DID URL into the DID and the optional fragment
pub fn split_did_url(did_url: &str) -> (&str, Option<&str>) {
    let (did, fragment) = match did_url.split_once('#') {
        Some((did, fragment)) => (did, Some(fragment)),
        None => (did_url, None),
    };
    let did = did.split(['?', '/']).next().unwrap_or(did);

    (did, fragment)
}

/// The method name of a DID (`key` for `did:key:z6Mk...`)
pub fn did_method(did: &str) -> Option<&str> {
    let mut parts = did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(identifier))
            if !method.is_empty() && !identifier.is_empty() =>
        {
            Some(method)
        }
        _ => None,
    }
}

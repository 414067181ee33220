use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::{DidResolver, ResolutionError};
use crate::{
    crypto::{
        did::{DidParser, DID_KEY_PREFIX},
        ed25519::ED25519_MULTICODEC,
        secp256k1::SECP256K1_MULTICODEC,
    },
    did::{
        split_did_url, DidDocument, VerificationMethod, VerificationRelationship, DID_CONTEXT_V1,
        ECDSA_SECP256K1_VERIFICATION_KEY_2019, ED25519_VERIFICATION_KEY_2020, MULTIKEY,
    },
};

/// Resolves `did:key` identifiers to a single-key document
#[derive(Default)]
pub struct KeyDidResolver {
    parser: DidParser,
}

impl KeyDidResolver {
    pub fn new(parser: DidParser) -> Self {
        KeyDidResolver { parser }
    }
}

#[async_trait]
impl DidResolver for KeyDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let (did, _) = split_did_url(did);
        let multibase = did
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or_else(|| ResolutionError::InvalidDid(did.to_owned()))?;

        let (codec, _) = DidParser::decode_multikey(multibase)
            .map_err(|error| ResolutionError::InvalidDid(format!("{did}: {error}")))?;
        self.parser
            .parse(did)
            .map_err(|error| ResolutionError::InvalidDid(format!("{did}: {error}")))?;

        let method_type = match codec {
            ED25519_MULTICODEC => ED25519_VERIFICATION_KEY_2020,
            SECP256K1_MULTICODEC => ECDSA_SECP256K1_VERIFICATION_KEY_2019,
            _ => MULTIKEY,
        };
        let method_id = format!("{did}#{multibase}");

        Ok(DidDocument {
            context: Some(json!([DID_CONTEXT_V1])),
            id: did.to_owned(),
            verification_method: vec![VerificationMethod {
                id: method_id.clone(),
                type_: method_type.to_owned(),
                controller: did.to_owned(),
                public_key_multibase: Some(multibase.to_owned()),
                ..Default::default()
            }],
            authentication: vec![VerificationRelationship::Reference(method_id.clone())],
            assertion_method: vec![VerificationRelationship::Reference(method_id)],
        })
    }
}

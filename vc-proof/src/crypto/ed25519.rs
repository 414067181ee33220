use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ed25519_zebra::{Signature, VerificationKey};

use super::{
    did::{DidParser, DID_KEY_PREFIX},
    KeyMaterial,
};

pub const ED25519_MULTICODEC: u64 = 0xed;
pub const EDDSA_ALGORITHM: &str = "EdDSA";

pub fn bytes_to_ed25519_key(bytes: Vec<u8>) -> Result<Box<dyn KeyMaterial>> {
    let key = VerificationKey::try_from(bytes.as_slice()).map_err(|error| anyhow!(error))?;
    Ok(Box::new(Ed25519PublicKey(key)))
}

/// The `did:key` identifier of an Ed25519 public key
pub fn ed25519_did(key: &VerificationKey) -> String {
    format!(
        "{}{}",
        DID_KEY_PREFIX,
        DidParser::encode_multikey(ED25519_MULTICODEC, key.as_ref())
    )
}

/// An Ed25519 public key, able to verify but not to sign
#[derive(Clone, Copy, Debug)]
pub struct Ed25519PublicKey(pub VerificationKey);

impl Ed25519PublicKey {
    pub fn verify_signature(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::try_from(signature).map_err(|error| anyhow!(error))?;
        self.0
            .verify(&signature, payload)
            .map_err(|error| anyhow!(error))
    }
}

#[async_trait]
impl KeyMaterial for Ed25519PublicKey {
    fn get_jwt_algorithm_name(&self) -> String {
        EDDSA_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        Ok(ed25519_did(&self.0))
    }

    async fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>> {
        Err(anyhow!("No private key; cannot sign data"))
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        self.verify_signature(payload, signature)
    }
}

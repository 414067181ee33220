use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ed25519_zebra::{Signature, SigningKey, VerificationKey};

use crate::crypto::{
    ed25519::{ed25519_did, EDDSA_ALGORITHM},
    KeyMaterial,
};

/// An in-memory Ed25519 signer
pub struct Ed25519Signer {
    signing_key: SigningKey,
    verification_key: VerificationKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: &[u8]) -> Self {
        let signing_key = SigningKey::try_from(seed).unwrap();
        Ed25519Signer {
            verification_key: VerificationKey::from(&signing_key),
            signing_key,
        }
    }

    pub fn generate() -> Self {
        let signing_key = SigningKey::new(rand::thread_rng());
        Ed25519Signer {
            verification_key: VerificationKey::from(&signing_key),
            signing_key,
        }
    }
}

#[async_trait]
impl KeyMaterial for Ed25519Signer {
    fn get_jwt_algorithm_name(&self) -> String {
        EDDSA_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        Ok(ed25519_did(&self.verification_key))
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(<[u8; 64]>::from(self.signing_key.sign(payload)).to_vec())
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::try_from(signature).map_err(|error| anyhow!(error))?;
        self.verification_key
            .verify(&signature, payload)
            .map_err(|error| anyhow!(error))
    }
}

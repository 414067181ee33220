use anyhow::{anyhow, Result};
use async_trait::async_trait;

use ed25519_zebra::{
    Signature, SigningKey as Ed25519PrivateKey, VerificationKey as Ed25519PublicKey,
};

use vc_proof::crypto::{
    ed25519::{ed25519_did, EDDSA_ALGORITHM},
    KeyMaterial,
};

/// An Ed25519 key pair identified by its `did:key`. Without a private key
/// it can only verify.
#[derive(Clone)]
pub struct Ed25519KeyMaterial(pub Ed25519PublicKey, pub Option<Ed25519PrivateKey>);

impl Ed25519KeyMaterial {
    pub fn from_private_key(private_key: Ed25519PrivateKey) -> Self {
        Ed25519KeyMaterial(Ed25519PublicKey::from(&private_key), Some(private_key))
    }

    /// Build from a 32 byte seed
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let private_key = Ed25519PrivateKey::try_from(seed).map_err(|error| anyhow!(error))?;
        Ok(Ed25519KeyMaterial::from_private_key(private_key))
    }
}

#[async_trait]
impl KeyMaterial for Ed25519KeyMaterial {
    fn get_jwt_algorithm_name(&self) -> String {
        EDDSA_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        Ok(ed25519_did(&self.0))
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match &self.1 {
            Some(private_key) => {
                let signature = private_key.sign(payload);
                let bytes: [u8; 64] = signature.into();
                Ok(bytes.to_vec())
            }
            None => Err(anyhow!("No private key; cannot sign data")),
        }
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::try_from(signature).map_err(|error| anyhow!(error))?;
        self.0
            .verify(&signature, payload)
            .map_err(|error| anyhow!(error))
    }
}

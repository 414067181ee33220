use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use vc_proof::crypto::{
    secp256k1::{ethereum_address, EthereumAddress, ES256K_R_ALGORITHM},
    KeyMaterial,
};

/// A secp256k1 key pair issuing as the `did:ethr` of its Ethereum address.
/// Signs ES256K-R: the SHA-256 digest of the signing input, encoded as
/// `r || s || v`.
#[derive(Clone)]
pub struct EthrKeyMaterial {
    verifying_key: VerifyingKey,
    signing_key: Option<SigningKey>,
    address: EthereumAddress,
}

impl EthrKeyMaterial {
    /// `chain_id` selects the network named in the DID; `None` leaves it
    /// implicit (mainnet)
    pub fn new(signing_key: SigningKey, chain_id: Option<u64>) -> Self {
        let verifying_key = *signing_key.verifying_key();
        EthrKeyMaterial {
            address: EthereumAddress::new(&ethereum_address(&verifying_key), chain_id),
            verifying_key,
            signing_key: Some(signing_key),
        }
    }

    pub fn from_secret(secret: &[u8], chain_id: Option<u64>) -> Result<Self> {
        let signing_key = SigningKey::from_slice(secret).map_err(|error| anyhow!(error))?;
        Ok(EthrKeyMaterial::new(signing_key, chain_id))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn address(&self) -> &str {
        self.address.address()
    }
}

#[async_trait]
impl KeyMaterial for EthrKeyMaterial {
    fn get_jwt_algorithm_name(&self) -> String {
        ES256K_R_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        self.address.get_did().await
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| anyhow!("No private key; cannot sign data"))?;

        let digest = Sha256::digest(payload);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|error| anyhow!(error))?;

        trace!("Signed {} bytes as {}", payload.len(), self.address.address());

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        Ok(bytes)
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        self.address.verify(payload, signature).await
    }
}

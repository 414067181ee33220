use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k256::{
    ecdsa::{signature::Verifier, RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use super::{
    did::{DidParser, DID_KEY_PREFIX},
    KeyMaterial,
};

pub const SECP256K1_MULTICODEC: u64 = 0xe7;
pub const ES256K_ALGORITHM: &str = "ES256K";
pub const ES256K_R_ALGORITHM: &str = "ES256K-R";
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

pub fn bytes_to_secp256k1_key(bytes: Vec<u8>) -> Result<Box<dyn KeyMaterial>> {
    let key = VerifyingKey::from_sec1_bytes(&bytes).map_err(|error| anyhow!(error))?;
    Ok(Box::new(Secp256k1PublicKey(key)))
}

/// The `0x`-prefixed, lower case Ethereum address controlled by a key
pub fn ethereum_address(key: &VerifyingKey) -> String {
    let point = k256::PublicKey::from(key).to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);

    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the key that produced an ES256K-R signature (`r || s || v`) over
/// the SHA-256 digest of `payload`
pub fn recover_key(payload: &[u8], signature: &[u8]) -> Result<VerifyingKey> {
    if signature.len() != RECOVERABLE_SIGNATURE_LENGTH {
        return Err(anyhow!(
            "Expected a {} byte recoverable signature, got {} bytes",
            RECOVERABLE_SIGNATURE_LENGTH,
            signature.len()
        ));
    }

    let recovery_byte = match signature[64] {
        v @ 27..=28 => v - 27,
        v => v,
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| anyhow!("Invalid recovery id: {}", signature[64]))?;
    let signature = Signature::from_slice(&signature[..64]).map_err(|error| anyhow!(error))?;
    let digest = Sha256::digest(payload);

    VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|error| anyhow!(error))
}

/// A secp256k1 public key. Verifies plain (64 byte) and recoverable
/// (65 byte) signatures.
#[derive(Clone, Debug)]
pub struct Secp256k1PublicKey(pub VerifyingKey);

#[async_trait]
impl KeyMaterial for Secp256k1PublicKey {
    fn get_jwt_algorithm_name(&self) -> String {
        ES256K_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        let point = k256::PublicKey::from(&self.0).to_encoded_point(true);
        Ok(format!(
            "{}{}",
            DID_KEY_PREFIX,
            DidParser::encode_multikey(SECP256K1_MULTICODEC, point.as_bytes())
        ))
    }

    async fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>> {
        Err(anyhow!("No private key; cannot sign data"))
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() == RECOVERABLE_SIGNATURE_LENGTH {
            return match recover_key(payload, signature)? == self.0 {
                true => Ok(()),
                false => Err(anyhow!("Recovered key does not match")),
            };
        }

        let signature = Signature::from_slice(signature).map_err(|error| anyhow!(error))?;
        self.0
            .verify(payload, &signature)
            .map_err(|error| anyhow!(error))
    }
}

/// An Ethereum account that signatures are checked against by public key
/// recovery (`EcdsaSecp256k1RecoveryMethod2020`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthereumAddress {
    address: String,
    chain_id: Option<u64>,
}

impl EthereumAddress {
    pub fn new(address: &str, chain_id: Option<u64>) -> Self {
        EthereumAddress {
            address: address.to_lowercase(),
            chain_id,
        }
    }

    /// Read a CAIP-10 (`eip155:1:0xabc...`) or legacy (`0xabc...@eip155:1`)
    /// blockchain account id
    pub fn from_account_id(account_id: &str) -> Result<Self> {
        let (namespace, reference, address) =
            match account_id.split(['@', ':']).collect::<Vec<_>>().as_slice() {
                [namespace, reference, address] if !account_id.contains('@') => {
                    (*namespace, *reference, *address)
                }
                [address, namespace, reference] => (*namespace, *reference, *address),
                _ => return Err(anyhow!("Invalid blockchain account id: {}", account_id)),
            };

        if namespace != "eip155" {
            return Err(anyhow!("Unsupported blockchain namespace: {}", namespace));
        }

        let chain_id = reference
            .parse::<u64>()
            .map_err(|_| anyhow!("Invalid chain reference: {}", reference))?;

        Ok(EthereumAddress::new(address, Some(chain_id)))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }
}

#[async_trait]
impl KeyMaterial for EthereumAddress {
    fn get_jwt_algorithm_name(&self) -> String {
        ES256K_R_ALGORITHM.into()
    }

    async fn get_did(&self) -> Result<String> {
        Ok(match self.chain_id {
            Some(chain_id) => format!("did:ethr:{:#x}:{}", chain_id, self.address),
            None => format!("did:ethr:{}", self.address),
        })
    }

    async fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>> {
        Err(anyhow!("No private key; cannot sign data"))
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let recovered = ethereum_address(&recover_key(payload, signature)?);

        match recovered.eq_ignore_ascii_case(&self.address) {
            true => Ok(()),
            false => Err(anyhow!(
                "Signature was produced by {}, expected {}",
                recovered,
                self.address
            )),
        }
    }
}

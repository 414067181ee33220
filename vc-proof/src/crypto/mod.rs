pub mod did;
pub mod ed25519;
pub mod secp256k1;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use did::KeyConstructorSlice;
use ed25519::{bytes_to_ed25519_key, ED25519_MULTICODEC};
use secp256k1::{bytes_to_secp256k1_key, SECP256K1_MULTICODEC};

/// This trait must be implemented by a struct that encapsulates cryptographic
/// keypair data. The trait represent the minimum required API capability for
/// producing a signed token from a cryptographic keypair, and verifying such
/// signatures.
#[async_trait]
pub trait KeyMaterial: Send + Sync {
    /// The algorithm that will be used to produce the signature returned by the
    /// sign method in this implementation
    fn get_jwt_algorithm_name(&self) -> String;

    /// Provides a valid DID that can be used to solve the key
    async fn get_did(&self) -> Result<String>;

    /// Sign some data with this key
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Verify the alleged signature of some data against this key
    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()>;
}

/// The signer capability a proof is issued with. Proof types only ever read
/// it.
pub type Issuer = Arc<dyn KeyMaterial>;

/// Public key codecs understood when reading `did:key` identifiers and
/// `publicKeyMultibase` values
pub const SUPPORTED_KEYS: &KeyConstructorSlice = &[
    // https://github.com/multiformats/multicodec/blob/master/table.csv
    (ED25519_MULTICODEC, bytes_to_ed25519_key),
    (SECP256K1_MULTICODEC, bytes_to_secp256k1_key),
];

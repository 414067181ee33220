use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::Ed25519Signer;
use crate::crypto::Issuer;

pub struct Identities {
    pub alice_key: Issuer,
    pub bob_key: Issuer,
    pub mallory_key: Issuer,

    pub alice_did: String,
    pub bob_did: String,
    pub mallory_did: String,
}

fn signer_from_secret(secret: &str) -> Issuer {
    // tweetnacl secret keys concat the public key; the seed is the first 32
    // bytes
    let secret = STANDARD.decode(secret).unwrap();
    Arc::new(Ed25519Signer::from_seed(&secret[0..32]))
}

impl Identities {
    pub async fn new() -> Self {
        let alice_key = signer_from_secret("U+bzp2GaFQHso587iSFWPSeCzbSfn/CbNHEz7ilKRZ1UQMmMS7qq4UhTzKn3X9Nj/4xgrwa+UqhMOeo4Ki8JUw==");
        let bob_key = signer_from_secret("G4+QCX1b3a45IzQsQd4gFMMe0UB1UOx9bCsh8uOiKLER69eAvVXvc8P2yc4Iig42Bv7JD2zJxhyFALyTKBHipg==");
        let mallory_key = signer_from_secret("LR9AL2MYkMARuvmV3MJV8sKvbSOdBtpggFCW8K62oZDR6UViSXdSV/dDcD8S9xVjS61vh62JITx7qmLgfQUSZQ==");

        Identities {
            alice_did: alice_key.get_did().await.unwrap(),
            bob_did: bob_key.get_did().await.unwrap(),
            mallory_did: mallory_key.get_did().await.unwrap(),

            alice_key,
            bob_key,
            mallory_key,
        }
    }
}

//! In-memory signers that can act as a `vc-proof` issuer

#[macro_use]
extern crate log;

pub mod ed25519;
pub mod secp256k1;

//! Pluggable proof types for verifiable credentials and presentations.
//!
//! A [`ProofType`] turns a credential (or presentation) into a proof and
//! checks that proof later. Two are provided: [`CredentialProof`] /
//! [`PresentationProof`] issue JWTs signed by a DID issuer and verify them
//! against resolved DID documents, and [`NearProof`] records attestations
//! in a NEAR registry contract.

pub mod credential;
pub mod crypto;
pub mod did;
pub mod error;
pub mod jwt;
pub mod proof;
pub mod proof_type;
pub mod resolver;
pub mod serde;
pub mod time;

pub use error::ProofError;
pub use proof::{
    CredentialProof, JwtProofConfig, JwtProofExtra, JwtVerifyExtra, NearConfig, NearProof,
    NearProofExtra, PresentationProof,
};
pub use proof_type::ProofType;

#[cfg(test)]
mod tests;

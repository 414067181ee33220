//! Error types for proof types

use thiserror::Error;

/// Configuration errors raised by proof types before any collaborator is
/// invoked. Operations return [`anyhow::Error`]; use
/// `error.downcast_ref::<ProofError>()` to recover the kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// Neither the call nor the instance supplied an issuer
    #[error("missing_issuer: No issuer has been configured")]
    MissingIssuer,
    /// Neither the call nor the instance supplied a DID resolver
    #[error("missing_resolver: No DID resolver has been configured")]
    MissingResolver,
    /// A ledger proof needs a wallet, a content identifier and an issuer
    #[error("missing_wallet_or_cid_or_issuer: Missing wallet, cid, or issuer")]
    MissingWalletOrCidOrIssuer,
    /// A ledger proof needs the subject DID (`credentialSubject.id`)
    #[error("missing_subject_id: Missing credentialSubject.id")]
    MissingSubjectId,
    /// A ledger proof string did not split into `<subjectDid>|<cid>`
    #[error("malformed_proof: Expected `<subjectDid>|<cid>`, found {fields} field(s)")]
    MalformedProof {
        /// Number of `|`-separated fields found
        fields: usize,
    },
}

impl ProofError {
    /// The short code that prefixes the error message
    pub fn code(&self) -> &'static str {
        match self {
            ProofError::MissingIssuer => "missing_issuer",
            ProofError::MissingResolver => "missing_resolver",
            ProofError::MissingWalletOrCidOrIssuer => "missing_wallet_or_cid_or_issuer",
            ProofError::MissingSubjectId => "missing_subject_id",
            ProofError::MalformedProof { .. } => "malformed_proof",
        }
    }
}

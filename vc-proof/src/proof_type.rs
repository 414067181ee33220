use anyhow::Result;
use async_trait::async_trait;

/// A named mechanism for attaching a proof to a credential or presentation
/// and checking it later. Implementations share no state with each other;
/// each fixes the object shape it accepts and the result it verifies to.
#[async_trait]
pub trait ProofType: Send + Sync {
    /// The credential or presentation shape this proof type attests
    type Object: Send + Sync;
    /// What `generate_proof` produces and `verify_proof` consumes
    type Proof: Send + Sync;
    /// Per-call input to `generate_proof`
    type Extra: Send;
    /// Per-call input to `verify_proof`
    type VerifyExtra: Send;
    type Verified;

    /// Stable identifier of this proof type
    const PROOF_TYPE: &'static str;

    async fn generate_proof(&self, object: &Self::Object, extra: Self::Extra)
        -> Result<Self::Proof>;

    async fn verify_proof(&self, proof: &Self::Proof, extra: Self::VerifyExtra)
        -> Result<Self::Verified>;

    fn proof_type(&self) -> &'static str {
        Self::PROOF_TYPE
    }
}

mod rpc;

pub use rpc::JsonRpcProvider;

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{credential::CredentialPayload, error::ProofError, proof_type::ProofType};

pub const NEAR_PROOF_TYPE: &str = "NearAttestationRegistry2025";

/// Gas attached to `issue_credential` calls (30 TGas)
pub const ISSUE_CREDENTIAL_GAS: u64 = 30_000_000_000_000;
pub const ISSUE_CREDENTIAL_METHOD: &str = "issue_credential";
pub const IS_VALID_METHOD: &str = "is_valid";

/// Separates the subject DID from the content identifier in a ledger proof
pub const PROOF_DELIMITER: char = '|';

/// Where the attestation registry lives. Defaults to NEAR testnet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NearConfig {
    /// Used to label log lines
    pub network_id: String,
    pub node_url: String,
    /// The registry contract
    pub contract_id: String,
    /// The account read-only queries are made as
    pub view_account_id: String,
}

impl Default for NearConfig {
    fn default() -> Self {
        NearConfig {
            network_id: "testnet".into(),
            node_url: "https://rpc.testnet.near.org".into(),
            contract_id: "neardtiprooftype.testnet".into(),
            view_account_id: "nearprooftype.testnet".into(),
        }
    }
}

/// A state-changing contract call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub contract_id: String,
    pub method_name: String,
    pub args: Value,
    pub gas: u64,
}

/// A signed-in NEAR account able to submit transactions
#[async_trait]
pub trait Account: Send + Sync {
    async fn function_call(&self, call: FunctionCall) -> Result<Value>;
}

/// The caller's wallet connection
pub trait Wallet: Send + Sync {
    fn account(&self) -> Arc<dyn Account>;
}

/// Read-only access to contract view methods
#[async_trait]
pub trait LedgerView: Send + Sync {
    async fn view_function(&self, contract_id: &str, method_name: &str, args: &Value)
        -> Result<Value>;
}

/// A ledger proof: `<subjectDid>|<cid>`. Neither part may contain the
/// delimiter; there is no escaping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerProof {
    pub subject_did: String,
    pub cid: String,
}

impl FromStr for LedgerProof {
    type Err = ProofError;

    fn from_str(proof: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = proof.split(PROOF_DELIMITER).collect();
        match fields[..] {
            [subject_did, cid] => Ok(LedgerProof {
                subject_did: subject_did.to_owned(),
                cid: cid.to_owned(),
            }),
            _ => Err(ProofError::MalformedProof {
                fields: fields.len(),
            }),
        }
    }
}

impl fmt::Display for LedgerProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.subject_did, PROOF_DELIMITER, self.cid)
    }
}

/// Per-call input to `generate_proof`
#[derive(Clone, Default)]
pub struct NearProofExtra {
    pub wallet: Option<Arc<dyn Wallet>>,
    /// Content identifier of the stored credential
    pub cid: Option<String>,
}

/// Proofs recorded as attestations in a NEAR registry contract. Issuing
/// submits a transaction through the caller's wallet; verifying queries the
/// contract's `is_valid` view.
#[derive(Clone, Default)]
pub struct NearProof {
    config: NearConfig,
    view: Option<Arc<dyn LedgerView>>,
}

impl NearProof {
    pub fn new(config: NearConfig) -> Self {
        NearProof { config, view: None }
    }

    /// Query through `view` instead of a JSON-RPC client for the configured
    /// node
    pub fn with_view(mut self, view: Arc<dyn LedgerView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn config(&self) -> &NearConfig {
        &self.config
    }

    fn connect(&self) -> Result<Arc<dyn LedgerView>> {
        match &self.view {
            Some(view) => Ok(view.clone()),
            None => Ok(Arc::new(JsonRpcProvider::new(&self.config.node_url)?)),
        }
    }
}

impl fmt::Debug for NearProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearProof")
            .field("config", &self.config)
            .field("view", &self.view.as_ref().map(|_| ".."))
            .finish()
    }
}

#[async_trait]
impl ProofType for NearProof {
    type Object = CredentialPayload;
    type Proof = String;
    type Extra = NearProofExtra;
    type VerifyExtra = ();
    type Verified = bool;

    const PROOF_TYPE: &'static str = NEAR_PROOF_TYPE;

    async fn generate_proof(
        &self,
        credential: &CredentialPayload,
        extra: NearProofExtra,
    ) -> Result<String> {
        let cid = extra.cid.filter(|cid| !cid.is_empty());
        let (wallet, cid) = match (extra.wallet, cid, credential.issuer_did()) {
            (Some(wallet), Some(cid), Some(_)) => (wallet, cid),
            _ => return Err(ProofError::MissingWalletOrCidOrIssuer.into()),
        };
        let subject_did = credential
            .subject_id()
            .ok_or(ProofError::MissingSubjectId)?
            .to_owned();

        let call = FunctionCall {
            contract_id: self.config.contract_id.clone(),
            method_name: ISSUE_CREDENTIAL_METHOD.into(),
            args: json!({
                "subject_did": subject_did,
                "cid": cid,
                "expires_at": null,
            }),
            gas: ISSUE_CREDENTIAL_GAS,
        };
        wallet.account().function_call(call).await?;

        let proof = LedgerProof { subject_did, cid };
        info!(
            "Recorded {} on {} ({})",
            proof, self.config.contract_id, self.config.network_id
        );
        Ok(proof.to_string())
    }

    async fn verify_proof(&self, proof: &String, _extra: ()) -> Result<bool> {
        let proof: LedgerProof = proof.parse()?;
        let view = self.connect()?;

        debug!(
            "Checking {} on {} as {}",
            proof, self.config.contract_id, self.config.view_account_id
        );
        let result = view
            .view_function(
                &self.config.contract_id,
                IS_VALID_METHOD,
                &json!({
                    "subject_did": proof.subject_did,
                    "cid": proof.cid,
                }),
            )
            .await?;

        result
            .as_bool()
            .ok_or_else(|| anyhow!("{} returned a non-boolean result: {}", IS_VALID_METHOD, result))
    }
}

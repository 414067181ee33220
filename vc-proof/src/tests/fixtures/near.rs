use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::proof::{Account, FunctionCall, LedgerView, Wallet};

/// A stand-in for the attestation registry contract: `issue_credential`
/// records an attestation, `is_valid` looks it up
#[derive(Default)]
pub struct InMemoryRegistry {
    pub calls: Mutex<Vec<FunctionCall>>,
    pub queries: Mutex<Vec<(String, String, Value)>>,
    attestations: Mutex<Vec<(String, String)>>,
    /// Answer every query with this value instead
    pub fixed_answer: Option<Value>,
}

impl InMemoryRegistry {
    pub fn answering(value: Value) -> Self {
        InMemoryRegistry {
            fixed_answer: Some(value),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<FunctionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

fn string_arg(args: &Value, name: &str) -> Result<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("Missing argument {}", name))
}

#[async_trait]
impl Account for InMemoryRegistry {
    async fn function_call(&self, call: FunctionCall) -> Result<Value> {
        let attestation = (
            string_arg(&call.args, "subject_did")?,
            string_arg(&call.args, "cid")?,
        );
        self.attestations.lock().unwrap().push(attestation);
        self.calls.lock().unwrap().push(call);
        Ok(Value::Null)
    }
}

#[async_trait]
impl LedgerView for InMemoryRegistry {
    async fn view_function(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
    ) -> Result<Value> {
        self.queries.lock().unwrap().push((
            contract_id.to_owned(),
            method_name.to_owned(),
            args.clone(),
        ));

        if let Some(answer) = &self.fixed_answer {
            return Ok(answer.clone());
        }

        let attestation = (string_arg(args, "subject_did")?, string_arg(args, "cid")?);
        Ok(Value::Bool(
            self.attestations.lock().unwrap().contains(&attestation),
        ))
    }
}

/// A wallet whose account writes to an [`InMemoryRegistry`]
pub struct RegistryWallet(pub Arc<InMemoryRegistry>);

impl Wallet for RegistryWallet {
    fn account(&self) -> Arc<dyn Account> {
        self.0.clone()
    }
}

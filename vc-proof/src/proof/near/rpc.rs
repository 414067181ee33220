use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::trace;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::LedgerView;

/// Calls contract view methods over NEAR JSON-RPC
#[derive(Clone, Debug)]
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: Url,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<CallFunctionResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Vec<u8>,
    #[serde(default)]
    error: Option<String>,
}

impl JsonRpcProvider {
    pub fn new(node_url: &str) -> Result<Self> {
        Ok(JsonRpcProvider {
            client: reqwest::Client::new(),
            url: Url::parse(node_url)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl LedgerView for JsonRpcProvider {
    async fn view_function(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
    ) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": "query",
            "params": {
                "request_type": "call_function",
                "finality": "final",
                "account_id": contract_id,
                "method_name": method_name,
                "args_base64": STANDARD.encode(serde_json::to_vec(args)?),
            },
        });

        trace!("Calling {}.{} via {}", contract_id, method_name, self.url);
        let response: RpcResponse = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response {
            RpcResponse {
                error: Some(error), ..
            } => Err(anyhow!("NEAR RPC error: {}", error)),
            RpcResponse {
                result: Some(CallFunctionResult {
                    error: Some(error), ..
                }),
                ..
            } => Err(anyhow!("{}.{} failed: {}", contract_id, method_name, error)),
            RpcResponse {
                result: Some(CallFunctionResult { result, .. }),
                ..
            } => Ok(serde_json::from_slice(&result)?),
            RpcResponse { .. } => Err(anyhow!("NEAR RPC returned neither result nor error")),
        }
    }
}

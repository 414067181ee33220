use anyhow::Result;
use async_trait::async_trait;
use k256::{ecdsa::VerifyingKey, elliptic_curve::sec1::ToEncodedPoint};
use log::debug;
use serde_json::json;
use url::Url;

use super::{DidResolver, ResolutionError, ResolverOptions};
use crate::{
    crypto::secp256k1::ethereum_address,
    did::{
        split_did_url, DidDocument, VerificationMethod, VerificationRelationship, DID_CONTEXT_V1,
        ECDSA_SECP256K1_RECOVERY_METHOD_2020, ECDSA_SECP256K1_VERIFICATION_KEY_2019,
    },
};

const ETHR_PREFIX: &str = "did:ethr:";
const SECP256K1_RECOVERY_CONTEXT: &str =
    "https://w3id.org/security/suites/secp256k1recovery-2020/v2";
const MAINNET: &str = "mainnet";

const KNOWN_NETWORKS: &[(&str, u64)] = &[
    (MAINNET, 1),
    ("goerli", 5),
    ("sepolia", 11155111),
    ("polygon", 137),
    ("amoy", 80002),
];

#[derive(Clone, Debug)]
struct EthrNetwork {
    name: Option<String>,
    chain_id: u64,
    registry: Option<String>,
    rpc_url: Url,
}

/// Resolves `did:ethr` identifiers on the configured networks to their
/// default document: the controlling Ethereum account (and, for public key
/// identifiers, the key itself). Registry change history is not read.
#[derive(Clone, Debug)]
pub struct EthrDidResolver {
    networks: Vec<EthrNetwork>,
}

impl EthrDidResolver {
    pub fn new(options: &ResolverOptions) -> Result<Self> {
        let configured = options.networks();
        if configured.is_empty() {
            return Err(ResolutionError::InvalidConfig("No networks configured".into()).into());
        }

        let mut networks = Vec::with_capacity(configured.len());
        for network in configured {
            let rpc_url = Url::parse(&network.rpc_url).map_err(|error| {
                ResolutionError::InvalidConfig(format!(
                    "Invalid rpcUrl `{}`: {}",
                    network.rpc_url, error
                ))
            })?;

            let chain_id = match (network.chain_id, network.name.as_deref()) {
                (Some(chain_id), _) => chain_id,
                (None, Some(name)) => known_chain_id(name).ok_or_else(|| {
                    ResolutionError::InvalidConfig(format!(
                        "Network `{name}` needs an explicit chainId"
                    ))
                })?,
                (None, None) => 1,
            };

            networks.push(EthrNetwork {
                name: network.name.clone(),
                chain_id,
                registry: network.registry.clone(),
                rpc_url,
            });
        }

        Ok(EthrDidResolver { networks })
    }

    /// `(chain id, registry, rpc url)` of every configured network
    pub fn networks(&self) -> impl Iterator<Item = (u64, Option<&str>, &Url)> {
        self.networks
            .iter()
            .map(|network| (network.chain_id, network.registry.as_deref(), &network.rpc_url))
    }

    fn network_for(&self, network: Option<&str>) -> Option<&EthrNetwork> {
        let chain_id = match network {
            None => 1,
            Some(hex) if hex.starts_with("0x") => u64::from_str_radix(&hex[2..], 16).ok()?,
            Some(name) => {
                if let Some(found) = self
                    .networks
                    .iter()
                    .find(|candidate| candidate.name.as_deref() == Some(name))
                {
                    return Some(found);
                }
                known_chain_id(name)?
            }
        };

        self.networks
            .iter()
            .find(|candidate| candidate.chain_id == chain_id)
            .or_else(|| match network {
                None => self
                    .networks
                    .iter()
                    .find(|candidate| candidate.name.as_deref() == Some(MAINNET)),
                Some(_) => None,
            })
    }
}

fn known_chain_id(name: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, chain_id)| *chain_id)
}

/// Split `did:ethr[:network]:identifier`
fn parse_ethr_did(did: &str) -> Option<(Option<&str>, &str)> {
    let rest = did.strip_prefix(ETHR_PREFIX)?;
    match rest.split(':').collect::<Vec<_>>().as_slice() {
        [identifier] => Some((None, *identifier)),
        [network, identifier] => Some((Some(*network), *identifier)),
        _ => None,
    }
}

fn is_hex(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit())
}

#[async_trait]
impl DidResolver for EthrDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let (did, _) = split_did_url(did);
        let (network, identifier) =
            parse_ethr_did(did).ok_or_else(|| ResolutionError::InvalidDid(did.to_owned()))?;
        let network = self
            .network_for(network)
            .ok_or_else(|| ResolutionError::UnknownNetwork(did.to_owned()))?;

        let hex_identifier = identifier
            .strip_prefix("0x")
            .filter(|hex| is_hex(hex))
            .ok_or_else(|| ResolutionError::InvalidDid(did.to_owned()))?;

        let (address, public_key) = match hex_identifier.len() {
            40 => (identifier.to_lowercase(), None),
            66 => {
                let bytes = hex::decode(hex_identifier)
                    .map_err(|error| ResolutionError::InvalidDid(format!("{did}: {error}")))?;
                let key = VerifyingKey::from_sec1_bytes(&bytes)
                    .map_err(|error| ResolutionError::InvalidDid(format!("{did}: {error}")))?;
                (ethereum_address(&key), Some(key))
            }
            _ => return Err(ResolutionError::InvalidDid(did.to_owned()).into()),
        };

        debug!("Resolving {} on chain {}", did, network.chain_id);

        let controller_id = format!("{did}#controller");
        let mut verification_method = vec![VerificationMethod {
            id: controller_id.clone(),
            type_: ECDSA_SECP256K1_RECOVERY_METHOD_2020.to_owned(),
            controller: did.to_owned(),
            blockchain_account_id: Some(format!("eip155:{}:{}", network.chain_id, address)),
            ..Default::default()
        }];
        let mut relationships = vec![VerificationRelationship::Reference(controller_id)];

        if let Some(key) = public_key {
            let key_id = format!("{did}#controllerKey");
            let point = k256::PublicKey::from(&key).to_encoded_point(true);
            verification_method.push(VerificationMethod {
                id: key_id.clone(),
                type_: ECDSA_SECP256K1_VERIFICATION_KEY_2019.to_owned(),
                controller: did.to_owned(),
                public_key_hex: Some(hex::encode(point.as_bytes())),
                ..Default::default()
            });
            relationships.push(VerificationRelationship::Reference(key_id));
        }

        Ok(DidDocument {
            context: Some(json!([DID_CONTEXT_V1, SECP256K1_RECOVERY_CONTEXT])),
            id: did.to_owned(),
            verification_method,
            authentication: relationships.clone(),
            assertion_method: relationships,
        })
    }
}

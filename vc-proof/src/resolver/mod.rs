//! DID resolution: the [`DidResolver`] capability, a method registry, and
//! the normalization of "ready resolver or raw network configuration"
//! inputs.

mod ethr;
mod key;

pub use ethr::EthrDidResolver;
pub use key::KeyDidResolver;

use std::{collections::BTreeMap, fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::did::{did_method, split_did_url, DidDocument};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("invalid_did: {0}")]
    InvalidDid(String),
    #[error("unsupported_did_method: No resolver is registered for DID method `{0}`")]
    UnsupportedMethod(String),
    #[error("unknown_network: `{0}` names a network that has not been configured")]
    UnknownNetwork(String),
    #[error("invalid_config: {0}")]
    InvalidConfig(String),
}

/// Maps a DID to its document
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DidDocument>;
}

/// A resolver that dispatches on the DID method name, e.g. `ethr` for
/// `did:ethr:0x...`. DID URL fragments and queries are dropped before
/// dispatch.
#[derive(Clone, Default)]
pub struct Resolver {
    methods: BTreeMap<String, Arc<dyn DidResolver>>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    pub fn with_method<R>(mut self, method: &str, resolver: R) -> Self
    where
        R: DidResolver + 'static,
    {
        self.methods.insert(method.to_owned(), Arc::new(resolver));
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

#[async_trait]
impl DidResolver for Resolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let (did, _) = split_did_url(did);
        let method = did_method(did).ok_or_else(|| ResolutionError::InvalidDid(did.to_owned()))?;

        match self.methods.get(method) {
            Some(resolver) => resolver.resolve(did).await,
            None => Err(ResolutionError::UnsupportedMethod(method.to_owned()).into()),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One network a registry-backed resolver can serve
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// Raw configuration from which a resolver is built: a single network
/// (`{registry, rpcUrl, chainId}`) or a provider list (`{networks: [...]}`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolverOptions {
    Network(NetworkConfiguration),
    Networks { networks: Vec<NetworkConfiguration> },
}

impl ResolverOptions {
    pub fn networks(&self) -> Vec<&NetworkConfiguration> {
        match self {
            ResolverOptions::Network(network) => vec![network],
            ResolverOptions::Networks { networks } => networks.iter().collect(),
        }
    }
}

impl From<NetworkConfiguration> for ResolverOptions {
    fn from(network: NetworkConfiguration) -> Self {
        ResolverOptions::Network(network)
    }
}

impl From<Vec<NetworkConfiguration>> for ResolverOptions {
    fn from(networks: Vec<NetworkConfiguration>) -> Self {
        ResolverOptions::Networks { networks }
    }
}

/// Either a resolver that is ready to use, or the configuration to build
/// one from. The caller decides which when supplying it.
#[derive(Clone)]
pub enum ResolverOrOptions {
    Resolver(Arc<dyn DidResolver>),
    Options(ResolverOptions),
}

impl ResolverOrOptions {
    pub fn resolver<R>(resolver: R) -> Self
    where
        R: DidResolver + 'static,
    {
        ResolverOrOptions::Resolver(Arc::new(resolver))
    }

    /// Produce the resolver to use. Raw options are built into a fresh
    /// resolver on every call.
    pub fn to_resolver(&self, factory: &dyn ResolverFactory) -> Result<Arc<dyn DidResolver>> {
        match self {
            ResolverOrOptions::Resolver(resolver) => Ok(resolver.clone()),
            ResolverOrOptions::Options(options) => factory.build(options),
        }
    }
}

impl fmt::Debug for ResolverOrOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverOrOptions::Resolver(_) => f.write_str("Resolver(..)"),
            ResolverOrOptions::Options(options) => f.debug_tuple("Options").field(options).finish(),
        }
    }
}

impl From<Arc<dyn DidResolver>> for ResolverOrOptions {
    fn from(resolver: Arc<dyn DidResolver>) -> Self {
        ResolverOrOptions::Resolver(resolver)
    }
}

impl From<ResolverOptions> for ResolverOrOptions {
    fn from(options: ResolverOptions) -> Self {
        ResolverOrOptions::Options(options)
    }
}

impl From<NetworkConfiguration> for ResolverOrOptions {
    fn from(network: NetworkConfiguration) -> Self {
        ResolverOrOptions::Options(network.into())
    }
}

/// Builds resolvers out of raw [`ResolverOptions`]
pub trait ResolverFactory: Send + Sync {
    fn build(&self, options: &ResolverOptions) -> Result<Arc<dyn DidResolver>>;
}

/// Builds a [`Resolver`] serving `did:ethr` on the configured networks and
/// `did:key`
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResolverFactory;

impl ResolverFactory for DefaultResolverFactory {
    fn build(&self, options: &ResolverOptions) -> Result<Arc<dyn DidResolver>> {
        debug!(
            "Building DID resolver for {} network(s)",
            options.networks().len()
        );

        let resolver = Resolver::new()
            .with_method("ethr", EthrDidResolver::new(options)?)
            .with_method("key", KeyDidResolver::default());

        Ok(Arc::new(resolver))
    }
}

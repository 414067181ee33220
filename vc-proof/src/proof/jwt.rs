use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::{
    credential::{CredentialPayload, PresentationPayload},
    crypto::Issuer,
    error::ProofError,
    jwt::{
        CreateOptions, DidJwtVc, JwtVc, VerifiedCredential, VerifiedPresentation, VerifyOptions,
        JWT_PROOF_TYPE,
    },
    proof_type::ProofType,
    resolver::{DefaultResolverFactory, DidResolver, ResolverFactory, ResolverOrOptions},
};

/// Defaults a JWT proof type falls back to when a call does not supply its
/// own
#[derive(Clone, Default)]
pub struct JwtProofConfig {
    pub issuer: Option<Issuer>,
    pub resolver: Option<ResolverOrOptions>,
    pub verify_options: VerifyOptions,
}

impl fmt::Debug for JwtProofConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtProofConfig")
            .field("issuer", &self.issuer.as_ref().map(|_| ".."))
            .field("resolver", &self.resolver)
            .field("verify_options", &self.verify_options)
            .finish()
    }
}

/// Per-call input to `generate_proof`
#[derive(Clone, Default)]
pub struct JwtProofExtra {
    /// Signs instead of the configured issuer
    pub issuer: Option<Issuer>,
    pub options: CreateOptions,
}

/// Per-call input to `verify_proof`
#[derive(Clone, Debug, Default)]
pub struct JwtVerifyExtra {
    /// Used instead of the configured resolver
    pub resolver: Option<ResolverOrOptions>,
    /// Overlaid on the configured verify options
    pub options: VerifyOptions,
}

struct JwtProofCore {
    config: JwtProofConfig,
    jwt_vc: Arc<dyn JwtVc>,
    resolver_factory: Arc<dyn ResolverFactory>,
}

impl JwtProofCore {
    fn new(config: JwtProofConfig) -> Self {
        JwtProofCore {
            config,
            jwt_vc: Arc::new(DidJwtVc::default()),
            resolver_factory: Arc::new(DefaultResolverFactory),
        }
    }

    fn issuer(&self, extra_issuer: Option<Issuer>) -> Result<Issuer> {
        Ok(extra_issuer
            .or_else(|| self.config.issuer.clone())
            .ok_or(ProofError::MissingIssuer)?)
    }

    /// Fill in the header `kid`: the object's own issuer if it names one,
    /// else the signer's DID. A `kid` already in the header is kept.
    async fn with_kid(
        issuer: &Issuer,
        object_issuer: Option<&str>,
        mut options: CreateOptions,
    ) -> Result<CreateOptions> {
        if !options.header.contains_key("kid") {
            let kid = match object_issuer {
                Some(did) => did.to_owned(),
                None => issuer.get_did().await?,
            };
            options.header.insert("kid".into(), Value::String(kid));
        }
        Ok(options)
    }

    fn verify_input(&self, extra: JwtVerifyExtra) -> Result<(Arc<dyn DidResolver>, VerifyOptions)> {
        let resolver = extra
            .resolver
            .as_ref()
            .or(self.config.resolver.as_ref())
            .ok_or(ProofError::MissingResolver)?
            .to_resolver(self.resolver_factory.as_ref())?;

        Ok((resolver, self.config.verify_options.merge(&extra.options)))
    }
}

macro_rules! jwt_proof_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name {
            core: JwtProofCore,
        }

        impl $name {
            pub fn new(config: JwtProofConfig) -> Self {
                $name {
                    core: JwtProofCore::new(config),
                }
            }

            /// Sign and verify through `jwt_vc` instead of [`DidJwtVc`]
            pub fn with_jwt_vc(mut self, jwt_vc: Arc<dyn JwtVc>) -> Self {
                self.core.jwt_vc = jwt_vc;
                self
            }

            /// Build resolvers from raw options with `factory`
            pub fn with_resolver_factory(mut self, factory: Arc<dyn ResolverFactory>) -> Self {
                self.core.resolver_factory = factory;
                self
            }

            pub fn config(&self) -> &JwtProofConfig {
                &self.core.config
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::new(JwtProofConfig::default())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("config", &self.core.config)
                    .finish()
            }
        }
    };
}

jwt_proof_type!(
    /// JWT proofs over credentials
    CredentialProof
);

jwt_proof_type!(
    /// JWT proofs over presentations
    PresentationProof
);

#[async_trait]
impl ProofType for CredentialProof {
    type Object = CredentialPayload;
    type Proof = String;
    type Extra = JwtProofExtra;
    type VerifyExtra = JwtVerifyExtra;
    type Verified = VerifiedCredential;

    const PROOF_TYPE: &'static str = JWT_PROOF_TYPE;

    async fn generate_proof(
        &self,
        credential: &CredentialPayload,
        extra: JwtProofExtra,
    ) -> Result<String> {
        let issuer = self.core.issuer(extra.issuer)?;
        let options =
            JwtProofCore::with_kid(&issuer, credential.issuer_did(), extra.options).await?;

        debug!("Issuing credential JWT, kid {:?}", options.header.get("kid"));
        self.core
            .jwt_vc
            .create_credential_jwt(credential, issuer.as_ref(), &options)
            .await
    }

    async fn verify_proof(
        &self,
        jwt: &String,
        extra: JwtVerifyExtra,
    ) -> Result<VerifiedCredential> {
        let (resolver, options) = self.core.verify_input(extra)?;

        self.core
            .jwt_vc
            .verify_credential(jwt, resolver.as_ref(), &options)
            .await
    }
}

#[async_trait]
impl ProofType for PresentationProof {
    type Object = PresentationPayload;
    type Proof = String;
    type Extra = JwtProofExtra;
    type VerifyExtra = JwtVerifyExtra;
    type Verified = VerifiedPresentation;

    const PROOF_TYPE: &'static str = JWT_PROOF_TYPE;

    async fn generate_proof(
        &self,
        presentation: &PresentationPayload,
        extra: JwtProofExtra,
    ) -> Result<String> {
        let issuer = self.core.issuer(extra.issuer)?;
        let options =
            JwtProofCore::with_kid(&issuer, presentation.issuer_did(), extra.options).await?;

        debug!("Issuing presentation JWT, kid {:?}", options.header.get("kid"));
        self.core
            .jwt_vc
            .create_presentation_jwt(presentation, issuer.as_ref(), &options)
            .await
    }

    async fn verify_proof(
        &self,
        jwt: &String,
        extra: JwtVerifyExtra,
    ) -> Result<VerifiedPresentation> {
        let (resolver, options) = self.core.verify_input(extra)?;

        self.core
            .jwt_vc
            .verify_presentation(jwt, resolver.as_ref(), &options)
            .await
    }
}

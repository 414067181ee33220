use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    credential::{CredentialPayload, PresentationPayload},
    crypto::KeyMaterial,
    jwt::{
        CreateOptions, DidJwtVc, JwtVc, VerifiedCredential, VerifiedPresentation, VerifyOptions,
    },
    resolver::{DidResolver, KeyDidResolver, ResolverFactory, ResolverOptions},
};

/// Delegates to [`DidJwtVc`], remembering every call it receives
#[derive(Default)]
pub struct RecordingJwtVc {
    inner: DidJwtVc,
    pub calls: Mutex<Vec<&'static str>>,
    pub create_options: Mutex<Vec<CreateOptions>>,
    pub verify_options: Mutex<Vec<VerifyOptions>>,
}

impl RecordingJwtVc {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JwtVc for RecordingJwtVc {
    async fn create_credential_jwt(
        &self,
        payload: &CredentialPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String> {
        self.calls.lock().unwrap().push("create_credential_jwt");
        self.create_options.lock().unwrap().push(options.clone());
        self.inner.create_credential_jwt(payload, issuer, options).await
    }

    async fn create_presentation_jwt(
        &self,
        payload: &PresentationPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String> {
        self.calls.lock().unwrap().push("create_presentation_jwt");
        self.create_options.lock().unwrap().push(options.clone());
        self.inner
            .create_presentation_jwt(payload, issuer, options)
            .await
    }

    async fn verify_credential(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedCredential> {
        self.calls.lock().unwrap().push("verify_credential");
        self.verify_options.lock().unwrap().push(options.clone());
        self.inner.verify_credential(jwt, resolver, options).await
    }

    async fn verify_presentation(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedPresentation> {
        self.calls.lock().unwrap().push("verify_presentation");
        self.verify_options.lock().unwrap().push(options.clone());
        self.inner.verify_presentation(jwt, resolver, options).await
    }
}

/// Builds `did:key` resolvers, counting how often it is asked to
#[derive(Default)]
pub struct CountingResolverFactory {
    pub builds: AtomicUsize,
    pub options: Mutex<Vec<ResolverOptions>>,
}

impl CountingResolverFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ResolverFactory for CountingResolverFactory {
    fn build(&self, options: &ResolverOptions) -> Result<Arc<dyn DidResolver>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options.clone());
        Ok(Arc::new(KeyDidResolver::default()))
    }
}

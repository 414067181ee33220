use std::str::FromStr;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, trace};
use serde_json::{json, Map, Value};

use super::{
    Algorithm, CreateOptions, Jwt, JwtError, JwtHeader, JwtVc, VerifiedCredential,
    VerifiedPresentation, VerifyOptions, VerifyPolicies, JWT_PROOF_TYPE,
};
use crate::{
    credential::{
        CredentialPayload, IssuerRef, PresentationPayload, DEFAULT_CONTEXT, DEFAULT_VC_TYPE,
        DEFAULT_VP_TYPE,
    },
    crypto::{did::DidParser, KeyMaterial},
    did::{split_did_url, DidDocument, VerificationMethod},
    resolver::DidResolver,
    time::now,
};

/// Clock skew tolerated by time checks unless configured otherwise
pub const DEFAULT_SKEW_SECONDS: u64 = 300;

const CREDENTIAL_FIELDS: &[&str] = &[
    "@context",
    "type",
    "credentialSubject",
    "credentialStatus",
    "credentialSchema",
    "evidence",
    "termsOfUse",
    "refreshService",
];
const PRESENTATION_FIELDS: &[&str] = &["@context", "type", "verifiableCredential"];

/// Issues and verifies W3C credentials and presentations encoded as JWTs.
/// W3C properties are moved into the `vc`/`vp` claim and mapped to their
/// registered claim names on issuance; verification reverses the mapping.
pub struct DidJwtVc {
    parser: DidParser,
}

impl DidJwtVc {
    pub fn new(parser: DidParser) -> Self {
        DidJwtVc { parser }
    }

    async fn create_jwt(
        &self,
        mut claims: Map<String, Value>,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String> {
        let did = issuer.get_did().await?;

        if let Some(iat) = options.iat {
            claims.insert("iat".into(), iat.into());
        }
        if let Some(expires_in) = options.expires_in {
            if !claims.contains_key("exp") {
                let start = claims
                    .get("nbf")
                    .and_then(Value::as_u64)
                    .or(options.iat)
                    .unwrap_or_else(now);
                let exp = start.checked_add(expires_in).ok_or_else(|| {
                    JwtError::InvalidArgument("expiresIn overflows".into())
                })?;
                claims.insert("exp".into(), exp.into());
            }
        }
        claims.insert("iss".into(), Value::String(did));

        let header = JwtHeader::new(&issuer.get_jwt_algorithm_name())
            .with_fields(options.header.clone())?;
        let jwt = Jwt::sign(header, claims, issuer).await?;

        trace!("Signed {} JWT, kid {:?}", jwt.header().alg, jwt.header().kid);
        jwt.encode()
    }

    async fn verify_jwt(
        &self,
        token: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<(Jwt, DidDocument, VerificationMethod, String)> {
        let jwt = Jwt::from_str(token)?;
        let algorithm = Algorithm::from_str(&jwt.header().alg).map_err(|_| {
            JwtError::NotSupported(format!(
                "No supported signature algorithm named {}",
                jwt.header().alg
            ))
        })?;

        let issuer = jwt
            .issuer()
            .ok_or_else(|| JwtError::InvalidJwt("JWT iss is required".into()))?
            .to_owned();
        let (did, _) = split_did_url(&issuer);

        let document = resolver.resolve(did).await.map_err(|error| {
            JwtError::ResolverError(format!(
                "Unable to resolve DID document for {did}: {error}"
            ))
        })?;
        let signer = self.verify_signature(&jwt, algorithm, &document).await?;

        let policies = options.policies.clone().unwrap_or_default();
        check_time_claims(
            jwt.payload(),
            &policies,
            options.skew_time.unwrap_or(DEFAULT_SKEW_SECONDS),
        )?;
        check_audience(jwt.payload(), &policies, options.audience.as_deref())?;

        debug!("Verified JWT issued by {} with {}", issuer, signer.id);
        Ok((jwt, document, signer, issuer))
    }

    /// Find the verification method whose key produced the signature. When
    /// the header names a `kid` that matches a usable method, only that
    /// method is tried.
    async fn verify_signature(
        &self,
        jwt: &Jwt,
        algorithm: Algorithm,
        document: &DidDocument,
    ) -> Result<VerificationMethod> {
        let mut candidates = Vec::new();
        for method in document.verification_methods() {
            match self.parser.parse_verification_method(method) {
                Ok(key) if algorithm.accepts(&key.get_jwt_algorithm_name()) => {
                    candidates.push((method, key))
                }
                Ok(_) => (),
                Err(error) => trace!("Skipping verification method {}: {}", method.id, error),
            }
        }

        let kid_fragment = jwt
            .header()
            .kid
            .as_deref()
            .and_then(|kid| split_did_url(kid).1);
        if let Some(fragment) = kid_fragment {
            let matches_kid =
                |method: &VerificationMethod| split_did_url(&method.id).1 == Some(fragment);
            if candidates.iter().any(|(method, _)| matches_kid(*method)) {
                candidates.retain(|(method, _)| matches_kid(*method));
            }
        }

        if candidates.is_empty() {
            return Err(anyhow!(JwtError::NoSuitableKeys(format!(
                "No suitable {} keys found in the DID document for {}",
                algorithm, document.id
            ))));
        }

        for (method, key) in candidates {
            if key.verify(jwt.signed_data(), jwt.signature()).await.is_ok() {
                return Ok(method.clone());
            }
        }

        Err(anyhow!(JwtError::InvalidSignature(
            "Signature invalid for JWT".into()
        )))
    }
}

impl Default for DidJwtVc {
    fn default() -> Self {
        DidJwtVc::new(DidParser::default())
    }
}

#[async_trait]
impl JwtVc for DidJwtVc {
    async fn create_credential_jwt(
        &self,
        payload: &CredentialPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String> {
        let claims = credential_claims(payload)?;
        validate_credential_claims(&claims)?;

        self.create_jwt(claims, issuer, options).await
    }

    async fn create_presentation_jwt(
        &self,
        payload: &PresentationPayload,
        issuer: &dyn KeyMaterial,
        options: &CreateOptions,
    ) -> Result<String> {
        let claims = presentation_claims(payload, options)?;
        validate_presentation_claims(&claims)?;

        self.create_jwt(claims, issuer, options).await
    }

    async fn verify_credential(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedCredential> {
        let (token, document, signer, issuer) = self.verify_jwt(jwt, resolver, options).await?;
        let policies = options.policies.clone().unwrap_or_default();

        if policies.format.unwrap_or(true) {
            validate_credential_claims(token.payload())?;
        }

        Ok(VerifiedCredential {
            verified: true,
            verifiable_credential: normalize_credential(token.payload(), jwt),
            payload: token.payload().clone(),
            did_resolution_result: document,
            issuer,
            signer,
            jwt: jwt.to_owned(),
            policies,
        })
    }

    async fn verify_presentation(
        &self,
        jwt: &str,
        resolver: &dyn DidResolver,
        options: &VerifyOptions,
    ) -> Result<VerifiedPresentation> {
        let mut jwt_options = options.clone();
        if jwt_options.audience.is_none() {
            jwt_options.audience = options.domain.clone();
        }

        let (token, document, signer, issuer) =
            self.verify_jwt(jwt, resolver, &jwt_options).await?;
        let policies = options.policies.clone().unwrap_or_default();

        if policies.format.unwrap_or(true) {
            validate_presentation_claims(token.payload())?;
        }
        check_challenge_and_domain(token.payload(), options)?;

        Ok(VerifiedPresentation {
            verified: true,
            verifiable_presentation: normalize_presentation(token.payload(), jwt),
            payload: token.payload().clone(),
            did_resolution_result: document,
            issuer,
            signer,
            jwt: jwt.to_owned(),
            policies,
        })
    }
}

fn into_claims<T: serde::Serialize>(payload: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(payload)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(anyhow!(JwtError::InvalidArgument(
            "Payload must be a JSON object".into()
        ))),
    }
}

fn take_object(claims: &mut Map<String, Value>, name: &str) -> Result<Map<String, Value>> {
    match claims.remove(name) {
        Some(Value::Object(object)) => Ok(object),
        None => Ok(Map::new()),
        Some(_) => Err(anyhow!(JwtError::InvalidArgument(format!(
            "{name} must be an object"
        )))),
    }
}

/// Move a W3C property onto a registered claim, unless the claim is
/// already set to something else
fn move_to_claim(
    claims: &mut Map<String, Value>,
    from: Option<Value>,
    claim: &str,
) -> Option<Value> {
    match (from, claims.get(claim)) {
        (Some(value), None) => {
            claims.insert(claim.to_owned(), value);
            None
        }
        (Some(value), Some(existing)) if *existing == value => None,
        (from, _) => from,
    }
}

fn timestamp(date: &str) -> Result<u64> {
    let seconds = DateTime::parse_from_rfc3339(date)
        .map_err(|error| JwtError::InvalidArgument(format!("Invalid date {date}: {error}")))?
        .timestamp();

    u64::try_from(seconds)
        .map_err(|_| anyhow!(JwtError::InvalidArgument(format!("Date before epoch: {date}"))))
}

fn rfc3339(seconds: u64) -> Option<Value> {
    let seconds = i64::try_from(seconds).ok()?;
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|date| Value::String(date.to_rfc3339_opts(SecondsFormat::Secs, true)))
}

fn credential_claims(payload: &CredentialPayload) -> Result<Map<String, Value>> {
    let mut claims = into_claims(payload)?;
    let mut vc = take_object(&mut claims, "vc")?;

    for field in CREDENTIAL_FIELDS {
        if let Some(value) = claims.remove(*field) {
            vc.entry(field.to_string()).or_insert(value);
        }
    }

    if let Some(Value::Object(subject)) = vc.get_mut("credentialSubject") {
        let id = subject.remove("id");
        if let Some(id) = move_to_claim(&mut claims, id, "sub") {
            subject.insert("id".into(), id);
        }
    }

    let id = claims.remove("id");
    if let Some(id) = move_to_claim(&mut claims, id, "jti") {
        vc.insert("id".into(), id);
    }

    // `iss` is always the signer's DID
    claims.remove("issuer");
    if let Some(IssuerRef::Object { extra, .. }) = &payload.issuer {
        if !extra.is_empty() {
            vc.insert("issuer".into(), Value::Object(extra.clone()));
        }
    }

    if let Some(date) = claims.remove("issuanceDate") {
        if let Some(date) = date.as_str() {
            let nbf = timestamp(date)?;
            claims.entry("nbf").or_insert_with(|| nbf.into());
        }
    }
    if let Some(date) = claims.remove("expirationDate") {
        if let Some(date) = date.as_str() {
            let exp = timestamp(date)?;
            claims.entry("exp").or_insert_with(|| exp.into());
        }
    }

    claims.insert("vc".into(), Value::Object(vc));
    Ok(claims)
}

fn presentation_claims(
    payload: &PresentationPayload,
    options: &CreateOptions,
) -> Result<Map<String, Value>> {
    let mut claims = into_claims(payload)?;
    let mut vp = take_object(&mut claims, "vp")?;

    for field in PRESENTATION_FIELDS {
        if let Some(value) = claims.remove(*field) {
            vp.entry(field.to_string()).or_insert(value);
        }
    }

    claims.remove("holder");

    let id = claims.remove("id");
    if let Some(id) = move_to_claim(&mut claims, id, "jti") {
        vp.insert("id".into(), id);
    }

    if let Some(challenge) = &options.challenge {
        claims
            .entry("nonce")
            .or_insert_with(|| Value::String(challenge.clone()));
    }
    if let Some(domain) = &options.domain {
        let mut audience = match claims.remove("aud") {
            Some(Value::Array(audience)) => audience,
            Some(audience) => vec![audience],
            None => Vec::new(),
        };
        let domain = Value::String(domain.clone());
        if !audience.contains(&domain) {
            audience.push(domain);
        }
        claims.insert("aud".into(), Value::Array(audience));
    }

    claims.insert("vp".into(), Value::Object(vp));
    Ok(claims)
}

fn contains_str(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(value)) => value.as_str() == expected,
        Some(Value::Array(values)) => values.iter().any(|value| value == expected),
        _ => false,
    }
}

fn validate_context_and_type(object: &Map<String, Value>, expected_type: &str) -> Result<()> {
    if !contains_str(object.get("@context"), DEFAULT_CONTEXT) {
        return Err(anyhow!(JwtError::InvalidArgument(format!(
            "@context is missing default context \"{DEFAULT_CONTEXT}\""
        ))));
    }
    if !contains_str(object.get("type"), expected_type) {
        return Err(anyhow!(JwtError::InvalidArgument(format!(
            "type is missing default \"{expected_type}\""
        ))));
    }
    Ok(())
}

fn validate_credential_claims(claims: &Map<String, Value>) -> Result<()> {
    let vc = claims
        .get("vc")
        .and_then(Value::as_object)
        .ok_or_else(|| JwtError::InvalidArgument("vc claim is required".into()))?;
    validate_context_and_type(vc, DEFAULT_VC_TYPE)?;

    match vc.get("credentialSubject") {
        Some(Value::Object(subject)) if !subject.is_empty() => Ok(()),
        Some(Value::Array(subjects)) if !subjects.is_empty() => Ok(()),
        _ => Err(anyhow!(JwtError::InvalidArgument(
            "credentialSubject must not be empty".into()
        ))),
    }
}

fn validate_presentation_claims(claims: &Map<String, Value>) -> Result<()> {
    let vp = claims
        .get("vp")
        .and_then(Value::as_object)
        .ok_or_else(|| JwtError::InvalidArgument("vp claim is required".into()))?;
    validate_context_and_type(vp, DEFAULT_VP_TYPE)?;

    match vp.get("verifiableCredential") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(credentials)) => {
            for credential in credentials {
                match credential {
                    Value::String(jwt) if jwt.split('.').count() == 3 => (),
                    Value::Object(_) => (),
                    _ => {
                        return Err(anyhow!(JwtError::InvalidArgument(
                            "verifiableCredential entries must be JWTs or objects".into()
                        )))
                    }
                }
            }
            Ok(())
        }
        Some(_) => Err(anyhow!(JwtError::InvalidArgument(
            "verifiableCredential must be an array".into()
        ))),
    }
}

fn check_time_claims(
    claims: &Map<String, Value>,
    policies: &VerifyPolicies,
    skew: u64,
) -> Result<()> {
    let now = policies.now.unwrap_or_else(now);
    let nbf = claims.get("nbf").and_then(Value::as_u64);
    let iat = claims.get("iat").and_then(Value::as_u64);

    if let Some(nbf) = nbf {
        if policies.nbf.unwrap_or(true) && nbf > now.saturating_add(skew) {
            return Err(anyhow!(JwtError::InvalidJwt(format!(
                "JWT not valid before nbf: {nbf}"
            ))));
        }
    } else if let Some(iat) = iat {
        if policies.iat.unwrap_or(true) && iat > now.saturating_add(skew) {
            return Err(anyhow!(JwtError::InvalidJwt(format!(
                "JWT not valid yet (issued in the future) iat: {iat}"
            ))));
        }
    }

    if let Some(exp) = claims.get("exp").and_then(Value::as_u64) {
        if policies.exp.unwrap_or(true) && exp.saturating_add(skew) <= now {
            return Err(anyhow!(JwtError::InvalidJwt(format!(
                "JWT has expired: exp: {exp} < now: {now}"
            ))));
        }
    }

    Ok(())
}

fn check_audience(
    claims: &Map<String, Value>,
    policies: &VerifyPolicies,
    audience: Option<&str>,
) -> Result<()> {
    if !policies.aud.unwrap_or(true) {
        return Ok(());
    }
    let Some(aud) = claims.get("aud") else {
        return Ok(());
    };

    match audience {
        None => Err(anyhow!(JwtError::InvalidConfig(
            "JWT audience is required but your app address has not been configured".into()
        ))),
        Some(expected) if contains_str(Some(aud), expected) => Ok(()),
        Some(expected) => Err(anyhow!(JwtError::InvalidAudience(format!(
            "JWT audience does not match your DID or callback url: {expected}"
        )))),
    }
}

fn check_challenge_and_domain(claims: &Map<String, Value>, options: &VerifyOptions) -> Result<()> {
    if let Some(challenge) = &options.challenge {
        if claims.get("nonce").and_then(Value::as_str) != Some(challenge.as_str()) {
            return Err(anyhow!(JwtError::InvalidArgument(format!(
                "Presentation does not contain the mandatory challenge (JWT: nonce) for: {challenge}"
            ))));
        }
    }
    if let Some(domain) = &options.domain {
        if !contains_str(claims.get("aud"), domain) {
            return Err(anyhow!(JwtError::InvalidArgument(format!(
                "Presentation does not contain the mandatory domain (JWT: aud) for: {domain}"
            ))));
        }
    }
    Ok(())
}

/// Rebuild the W3C shape of a credential from its JWT claims
fn normalize_credential(claims: &Map<String, Value>, jwt: &str) -> Value {
    let mut credential = claims
        .get("vc")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(sub) = claims.get("sub") {
        match credential.get_mut("credentialSubject") {
            Some(Value::Object(subject)) => {
                subject.entry("id").or_insert_with(|| sub.clone());
            }
            None => {
                credential.insert("credentialSubject".into(), json!({ "id": sub }));
            }
            Some(_) => (),
        }
    }
    if let Some(jti) = claims.get("jti") {
        credential.entry("id").or_insert_with(|| jti.clone());
    }
    if let Some(iss) = claims.get("iss") {
        match credential.get_mut("issuer") {
            Some(Value::Object(issuer)) => {
                issuer.insert("id".into(), iss.clone());
            }
            _ => {
                credential.insert("issuer".into(), json!({ "id": iss }));
            }
        }
    }

    let issued = claims
        .get("nbf")
        .or_else(|| claims.get("iat"))
        .and_then(Value::as_u64)
        .and_then(rfc3339);
    if let Some(issued) = issued {
        credential.entry("issuanceDate").or_insert(issued);
    }
    if let Some(expires) = claims.get("exp").and_then(Value::as_u64).and_then(rfc3339) {
        credential.entry("expirationDate").or_insert(expires);
    }

    credential.insert(
        "proof".into(),
        json!({ "type": JWT_PROOF_TYPE, "jwt": jwt }),
    );
    Value::Object(credential)
}

/// Rebuild the W3C shape of a presentation from its JWT claims. Embedded
/// credential JWTs are normalized without being verified.
fn normalize_presentation(claims: &Map<String, Value>, jwt: &str) -> Value {
    let mut presentation = claims
        .get("vp")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(iss) = claims.get("iss") {
        presentation.entry("holder").or_insert_with(|| iss.clone());
    }
    if let Some(jti) = claims.get("jti") {
        presentation.entry("id").or_insert_with(|| jti.clone());
    }

    if let Some(Value::Array(credentials)) = presentation.get_mut("verifiableCredential") {
        for credential in credentials.iter_mut() {
            let normalized = match &*credential {
                Value::String(token) => Jwt::from_str(token)
                    .ok()
                    .map(|decoded| normalize_credential(decoded.payload(), token)),
                _ => None,
            };
            if let Some(normalized) = normalized {
                *credential = normalized;
            }
        }
    }

    let issued = claims
        .get("nbf")
        .or_else(|| claims.get("iat"))
        .and_then(Value::as_u64)
        .and_then(rfc3339);
    if let Some(issued) = issued {
        presentation.entry("issuanceDate").or_insert(issued);
    }
    if let Some(expires) = claims.get("exp").and_then(Value::as_u64).and_then(rfc3339) {
        presentation.entry("expirationDate").or_insert(expires);
    }

    presentation.insert(
        "proof".into(),
        json!({ "type": JWT_PROOF_TYPE, "jwt": jwt }),
    );
    Value::Object(presentation)
}

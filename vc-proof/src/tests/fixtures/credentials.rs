use serde_json::json;

use crate::credential::{CredentialPayload, PresentationPayload};

/// A W3C shaped credential with one subject claim
pub fn credential(issuer: Option<&str>, subject: &str) -> CredentialPayload {
    let mut credential: CredentialPayload = serde_json::from_value(json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiableCredential", "DegreeCredential"],
        "issuanceDate": "2024-01-01T00:00:00Z",
        "credentialSubject": {
            "id": subject,
            "degree": { "type": "BachelorDegree", "name": "Bachelor of Science" }
        }
    }))
    .unwrap();

    credential.issuer = issuer.map(Into::into);
    credential
}

pub fn presentation(holder: Option<&str>, credentials: Vec<String>) -> PresentationPayload {
    serde_json::from_value(json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiablePresentation"],
        "holder": holder,
        "verifiableCredential": credentials,
    }))
    .unwrap()
}

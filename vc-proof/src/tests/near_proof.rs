mod generate {
    use std::sync::Arc;

    use serde_json::json;

    use crate::{
        error::ProofError,
        proof::{NearProof, NearProofExtra, ISSUE_CREDENTIAL_GAS},
        proof_type::ProofType,
        tests::fixtures::{credential, InMemoryRegistry, RegistryWallet},
    };

    fn extra(registry: &Arc<InMemoryRegistry>, cid: Option<&str>) -> NearProofExtra {
        NearProofExtra {
            wallet: Some(Arc::new(RegistryWallet(registry.clone()))),
            cid: cid.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn it_records_the_attestation_and_returns_the_composite_proof() {
        let registry = Arc::new(InMemoryRegistry::default());
        let credential = credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet");

        let proof = NearProof::default()
            .generate_proof(&credential, extra(&registry, Some("bafy-123")))
            .await
            .unwrap();

        assert_eq!(proof, "did:near:alice.testnet|bafy-123");

        let calls = registry.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].contract_id, "neardtiprooftype.testnet");
        assert_eq!(calls[0].method_name, "issue_credential");
        assert_eq!(calls[0].gas, ISSUE_CREDENTIAL_GAS);
        assert_eq!(
            calls[0].args,
            json!({
                "subject_did": "did:near:alice.testnet",
                "cid": "bafy-123",
                "expires_at": null
            })
        );
    }

    #[tokio::test]
    async fn it_fails_without_a_cid_before_calling_the_contract() {
        let registry = Arc::new(InMemoryRegistry::default());
        let credential = credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet");

        for cid in [None, Some("")] {
            let error = NearProof::default()
                .generate_proof(&credential, extra(&registry, cid))
                .await
                .unwrap_err();

            assert_eq!(
                error.downcast_ref::<ProofError>(),
                Some(&ProofError::MissingWalletOrCidOrIssuer)
            );
        }
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn it_fails_without_a_wallet_or_an_issuer() {
        let registry = Arc::new(InMemoryRegistry::default());

        let error = NearProof::default()
            .generate_proof(
                &credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet"),
                NearProofExtra {
                    wallet: None,
                    cid: Some("bafy-123".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<ProofError>(),
            Some(&ProofError::MissingWalletOrCidOrIssuer)
        );

        let error = NearProof::default()
            .generate_proof(
                &credential(None, "did:near:alice.testnet"),
                extra(&registry, Some("bafy-123")),
            )
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<ProofError>(),
            Some(&ProofError::MissingWalletOrCidOrIssuer)
        );
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn it_accepts_a_jwt_style_issuer() {
        let registry = Arc::new(InMemoryRegistry::default());
        let mut credential = credential(None, "did:near:alice.testnet");
        credential.iss = Some("did:near:issuer.testnet".into());

        let proof = NearProof::default()
            .generate_proof(&credential, extra(&registry, Some("bafy-123")))
            .await
            .unwrap();

        assert_eq!(proof, "did:near:alice.testnet|bafy-123");
    }

    #[tokio::test]
    async fn it_fails_without_a_subject() {
        let registry = Arc::new(InMemoryRegistry::default());
        let mut credential = credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet");
        credential.credential_subject = Some(json!({ "name": "Alice" }));

        let error = NearProof::default()
            .generate_proof(&credential, extra(&registry, Some("bafy-123")))
            .await
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<ProofError>(),
            Some(&ProofError::MissingSubjectId)
        );
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn it_does_not_deduplicate_issuance() {
        let registry = Arc::new(InMemoryRegistry::default());
        let credential = credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet");
        let proof_type = NearProof::default();

        let first = proof_type
            .generate_proof(&credential, extra(&registry, Some("bafy-123")))
            .await
            .unwrap();
        let second = proof_type
            .generate_proof(&credential, extra(&registry, Some("bafy-123")))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.calls().len(), 2);
    }

    #[test]
    fn it_names_its_proof_type() {
        assert_eq!(NearProof::default().proof_type(), "NearAttestationRegistry2025");
    }
}

mod verify {
    use std::sync::Arc;

    use serde_json::json;

    use crate::{
        error::ProofError,
        proof::{NearConfig, NearProof, NearProofExtra},
        proof_type::ProofType,
        tests::fixtures::{credential, InMemoryRegistry, RegistryWallet},
    };

    #[tokio::test]
    async fn it_confirms_an_issued_attestation() {
        let registry = Arc::new(InMemoryRegistry::default());
        let proof_type = NearProof::default().with_view(registry.clone());

        let proof = proof_type
            .generate_proof(
                &credential(Some("did:near:issuer.testnet"), "did:near:alice.testnet"),
                NearProofExtra {
                    wallet: Some(Arc::new(RegistryWallet(registry.clone()))),
                    cid: Some("bafy-123".into()),
                },
            )
            .await
            .unwrap();

        assert!(proof_type.verify_proof(&proof, ()).await.unwrap());
        assert!(!proof_type
            .verify_proof(&"did:near:alice.testnet|bafy-456".to_owned(), ())
            .await
            .unwrap());

        let queries = registry.queries.lock().unwrap();
        assert_eq!(queries[0].0, "neardtiprooftype.testnet");
        assert_eq!(queries[0].1, "is_valid");
        assert_eq!(
            queries[0].2,
            json!({ "subject_did": "did:near:alice.testnet", "cid": "bafy-123" })
        );
    }

    #[tokio::test]
    async fn it_rejects_malformed_proofs_before_querying() {
        let registry = Arc::new(InMemoryRegistry::answering(json!(true)));
        let proof_type = NearProof::default().with_view(registry.clone());

        for (proof, fields) in [("did:near:alice.testnet", 1), ("a|b|c", 3)] {
            let error = proof_type
                .verify_proof(&proof.to_owned(), ())
                .await
                .unwrap_err();

            assert_eq!(
                error.downcast_ref::<ProofError>(),
                Some(&ProofError::MalformedProof { fields })
            );
        }
        assert_eq!(registry.query_count(), 0);
    }

    #[tokio::test]
    async fn it_passes_the_contract_answer_through() {
        let proof = "did:near:alice.testnet|bafy-123".to_owned();

        let no =
            NearProof::default().with_view(Arc::new(InMemoryRegistry::answering(json!(false))));
        assert!(!no.verify_proof(&proof, ()).await.unwrap());

        let odd =
            NearProof::default().with_view(Arc::new(InMemoryRegistry::answering(json!("yes"))));
        assert!(odd.verify_proof(&proof, ()).await.is_err());
    }

    #[tokio::test]
    async fn it_queries_the_configured_contract() {
        let registry = Arc::new(InMemoryRegistry::answering(json!(true)));
        let proof_type = NearProof::new(NearConfig {
            contract_id: "registry.near".into(),
            ..Default::default()
        })
        .with_view(registry.clone());

        assert!(proof_type
            .verify_proof(&"did:near:alice.near|bafy-123".to_owned(), ())
            .await
            .unwrap());
        assert_eq!(registry.queries.lock().unwrap()[0].0, "registry.near");
    }
}

mod proof_format {
    use crate::{
        error::ProofError,
        proof::{LedgerProof, NearConfig},
    };

    #[test]
    fn it_parses_and_displays_the_composite_format() {
        let proof: LedgerProof = "did:near:alice.testnet|bafy-123".parse().unwrap();

        assert_eq!(proof.subject_did, "did:near:alice.testnet");
        assert_eq!(proof.cid, "bafy-123");
        assert_eq!(proof.to_string(), "did:near:alice.testnet|bafy-123");
    }

    #[test]
    fn it_counts_fields_in_malformed_proofs() {
        assert_eq!(
            "".parse::<LedgerProof>(),
            Err(ProofError::MalformedProof { fields: 1 })
        );
        assert_eq!(
            "did:a|b|c|d".parse::<LedgerProof>(),
            Err(ProofError::MalformedProof { fields: 4 })
        );
    }

    #[test]
    fn it_prefixes_messages_with_the_error_code() {
        let errors = [
            ProofError::MissingIssuer,
            ProofError::MissingResolver,
            ProofError::MissingWalletOrCidOrIssuer,
            ProofError::MissingSubjectId,
            ProofError::MalformedProof { fields: 3 },
        ];

        for error in errors {
            assert!(error.to_string().starts_with(&format!("{}: ", error.code())));
        }
        assert_eq!(ProofError::MalformedProof { fields: 3 }.code(), "malformed_proof");
    }

    #[test]
    fn it_defaults_to_testnet() {
        let config: NearConfig =
            serde_json::from_str(r#"{"contractId":"registry.near","networkId":"mainnet"}"#)
                .unwrap();

        assert_eq!(config.contract_id, "registry.near");
        assert_eq!(config.network_id, "mainnet");
        assert_eq!(config.node_url, "https://rpc.testnet.near.org");
        assert_eq!(NearConfig::default().contract_id, "neardtiprooftype.testnet");
    }
}

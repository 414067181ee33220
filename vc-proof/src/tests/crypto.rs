mod did_from_key {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use ed25519_zebra::VerificationKey;

    use crate::crypto::{
        did::DidParser,
        ed25519::{ed25519_did, Ed25519PublicKey, ED25519_MULTICODEC},
        KeyMaterial,
    };

    #[tokio::test]
    async fn it_handles_ed25519_keys() {
        let pub_key = STANDARD
            .decode("Hv+AVRD2WUjUFOsSNbsmrp9fokuwrUnjBcr92f0kxw4=")
            .unwrap();
        let key = Ed25519PublicKey(VerificationKey::try_from(pub_key.as_slice()).unwrap());

        let expected_did = "did:key:z6MkgYGF3thn8k1Fv4p4dWXKtsXCnLH7q9yw4QgNPULDmDKB";
        let result_did = key.get_did().await.unwrap();

        assert_eq!(expected_did, result_did.as_str());
        assert_eq!(ed25519_did(&key.0), expected_did);
    }

    #[test]
    fn it_round_trips_multikeys() {
        let multibase = "z6MkgYGF3thn8k1Fv4p4dWXKtsXCnLH7q9yw4QgNPULDmDKB";
        let (codec, key) = DidParser::decode_multikey(multibase).unwrap();

        assert_eq!(codec, ED25519_MULTICODEC);
        assert_eq!(key.len(), 32);
        assert_eq!(DidParser::encode_multikey(codec, &key), multibase);
    }

    #[test]
    fn it_rejects_unknown_codecs_and_encodings() {
        let parser = DidParser::default();

        // 0x1205 is the RSA multicodec
        let rsa = DidParser::encode_multikey(0x1205, &[1, 2, 3]);
        assert!(parser.parse(&format!("did:key:{rsa}")).is_err());
        assert!(parser.parse("did:key:mAQID").is_err());
        assert!(parser.parse("did:web:example.com").is_err());
    }
}

mod signatures {
    use crate::{
        crypto::{did::DidParser, KeyMaterial},
        tests::fixtures::{Ed25519Signer, Identities},
    };

    #[tokio::test]
    async fn it_verifies_signatures_from_a_parsed_did() {
        let identities = Identities::new().await;
        let parser = DidParser::default();
        let payload = b"header.payload";

        let signature = identities.alice_key.sign(payload).await.unwrap();
        let alice = parser.parse(&identities.alice_did).unwrap();

        alice.verify(payload, &signature).await.unwrap();
        assert!(alice.verify(b"header.tampered", &signature).await.is_err());

        let bob = parser.parse(&identities.bob_did).unwrap();
        assert!(bob.verify(payload, &signature).await.is_err());
    }

    #[tokio::test]
    async fn it_cannot_sign_with_a_public_key() {
        let signer = Ed25519Signer::generate();
        let public = DidParser::default()
            .parse(&signer.get_did().await.unwrap())
            .unwrap();

        assert!(public.sign(b"payload").await.is_err());
    }
}

mod ethereum {
    use k256::ecdsa::{SigningKey, VerifyingKey};
    use sha2::{Digest, Sha256};

    use crate::crypto::{
        secp256k1::{ethereum_address, recover_key, EthereumAddress, Secp256k1PublicKey},
        KeyMaterial,
    };

    fn signing_key() -> SigningKey {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        SigningKey::from_slice(&secret).unwrap()
    }

    fn sign_recoverable(key: &SigningKey, payload: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(payload);
        let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        bytes
    }

    #[test]
    fn it_derives_the_ethereum_address_of_a_key() {
        let key = signing_key();
        assert_eq!(
            ethereum_address(key.verifying_key()),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn it_reads_caip10_and_legacy_account_ids() {
        let caip10 =
            EthereumAddress::from_account_id("eip155:1:0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
                .unwrap();
        let legacy =
            EthereumAddress::from_account_id("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf@eip155:1")
                .unwrap();

        assert_eq!(caip10, legacy);
        assert_eq!(caip10.chain_id(), Some(1));
        assert_eq!(caip10.address(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert!(EthereumAddress::from_account_id("cosmos:hub:abc").is_err());
    }

    #[tokio::test]
    async fn it_verifies_recoverable_signatures_against_an_address() {
        let key = signing_key();
        let payload = b"header.payload";
        let signature = sign_recoverable(&key, payload);

        let recovered: VerifyingKey = recover_key(payload, &signature).unwrap();
        assert_eq!(&recovered, key.verifying_key());

        let address = EthereumAddress::new(&ethereum_address(key.verifying_key()), Some(1));
        address.verify(payload, &signature).await.unwrap();
        assert!(address.verify(b"header.tampered", &signature).await.is_err());

        let mut legacy_v = signature.clone();
        legacy_v[64] += 27;
        address.verify(payload, &legacy_v).await.unwrap();

        let public_key = Secp256k1PublicKey(*key.verifying_key());
        public_key.verify(payload, &signature).await.unwrap();
    }

    #[tokio::test]
    async fn it_names_ethr_dids_by_chain() {
        let address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

        assert_eq!(
            EthereumAddress::new(address, Some(1)).get_did().await.unwrap(),
            format!("did:ethr:0x1:{address}")
        );
        assert_eq!(
            EthereumAddress::new(address, None).get_did().await.unwrap(),
            format!("did:ethr:{address}")
        );
    }
}

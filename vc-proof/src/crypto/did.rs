use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use super::{
    ed25519::ED25519_MULTICODEC,
    secp256k1::{EthereumAddress, SECP256K1_MULTICODEC},
    KeyMaterial,
};
use crate::did::{
    VerificationMethod, ECDSA_SECP256K1_RECOVERY_METHOD_2020,
    ECDSA_SECP256K1_VERIFICATION_KEY_2019, ED25519_VERIFICATION_KEY_2018,
    ED25519_VERIFICATION_KEY_2020,
};

pub type Multicodec = u64;
pub type BytesToKey = fn(Vec<u8>) -> Result<Box<dyn KeyMaterial>>;
pub type KeyConstructors = BTreeMap<Multicodec, BytesToKey>;
pub type KeyConstructorSlice = [(Multicodec, BytesToKey)];

pub const DID_KEY_PREFIX: &str = "did:key:";
pub const BASE58_MULTIBASE_PREFIX: char = 'z';

/// A parser that is able to convert from a DID string or a DID document
/// verification method into a corresponding [`KeyMaterial`] implementation.
/// Multibase keys carry a multicodec prefix that is matched against the
/// registered constructor functions.
pub struct DidParser {
    key_constructors: KeyConstructors,
}

impl DidParser {
    pub fn new(key_constructor_slice: &KeyConstructorSlice) -> Self {
        let mut key_constructors = BTreeMap::new();
        for pair in key_constructor_slice {
            key_constructors.insert(pair.0, pair.1);
        }
        DidParser { key_constructors }
    }

    /// Split a base58btc multibase string into its multicodec and key bytes
    pub fn decode_multikey(multibase: &str) -> Result<(Multicodec, Vec<u8>)> {
        let encoded = multibase
            .strip_prefix(BASE58_MULTIBASE_PREFIX)
            .ok_or_else(|| anyhow!("Unsupported multibase encoding: {}", multibase))?;
        let bytes = bs58::decode(encoded).into_vec()?;
        let (codec, key) = unsigned_varint::decode::u64(&bytes)
            .map_err(|error| anyhow!("Invalid multicodec prefix: {}", error))?;

        Ok((codec, key.to_vec()))
    }

    /// The inverse of [`DidParser::decode_multikey`]
    pub fn encode_multikey(codec: Multicodec, key: &[u8]) -> String {
        let mut buffer = unsigned_varint::encode::u64_buffer();
        let prefix = unsigned_varint::encode::u64(codec, &mut buffer);

        format!(
            "{}{}",
            BASE58_MULTIBASE_PREFIX,
            bs58::encode([prefix, key].concat()).into_string()
        )
    }

    pub fn parse_multikey(&self, multibase: &str) -> Result<Box<dyn KeyMaterial>> {
        let (codec, bytes) = Self::decode_multikey(multibase)?;
        self.construct(codec, bytes)
    }

    /// Parse a `did:key` DID (or DID URL) into its key
    pub fn parse(&self, did: &str) -> Result<Box<dyn KeyMaterial>> {
        let identifier = did
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or_else(|| anyhow!("Not a did:key DID: {}", did))?;
        let multibase = identifier.split('#').next().unwrap_or_default();

        self.parse_multikey(multibase)
    }

    /// Produce a verifier for the key material published by a verification
    /// method
    pub fn parse_verification_method(
        &self,
        method: &VerificationMethod,
    ) -> Result<Box<dyn KeyMaterial>> {
        if let Some(multibase) = &method.public_key_multibase {
            return self.parse_multikey(multibase);
        }

        if let Some(base58) = &method.public_key_base58 {
            let codec = codec_for_method_type(&method.type_)?;
            return self.construct(codec, bs58::decode(base58).into_vec()?);
        }

        if let Some(public_key_hex) = &method.public_key_hex {
            let codec = codec_for_method_type(&method.type_)?;
            let bytes = hex::decode(public_key_hex.trim_start_matches("0x"))?;
            return self.construct(codec, bytes);
        }

        if method.type_ == ECDSA_SECP256K1_RECOVERY_METHOD_2020 {
            if let Some(account_id) = &method.blockchain_account_id {
                return Ok(Box::new(EthereumAddress::from_account_id(account_id)?));
            }
            if let Some(address) = &method.ethereum_address {
                return Ok(Box::new(EthereumAddress::new(address, None)));
            }
        }

        Err(anyhow!(
            "Verification method {} publishes no supported key material",
            method.id
        ))
    }

    fn construct(&self, codec: Multicodec, bytes: Vec<u8>) -> Result<Box<dyn KeyMaterial>> {
        match self.key_constructors.get(&codec) {
            Some(ctor) => ctor(bytes),
            None => Err(anyhow!("Unrecognized multicodec: {:#x}", codec)),
        }
    }
}

impl Default for DidParser {
    fn default() -> Self {
        DidParser::new(super::SUPPORTED_KEYS)
    }
}

fn codec_for_method_type(method_type: &str) -> Result<Multicodec> {
    match method_type {
        ED25519_VERIFICATION_KEY_2018 | ED25519_VERIFICATION_KEY_2020 => Ok(ED25519_MULTICODEC),
        ECDSA_SECP256K1_VERIFICATION_KEY_2019 | ECDSA_SECP256K1_RECOVERY_METHOD_2020 => {
            Ok(SECP256K1_MULTICODEC)
        }
        other => Err(anyhow!("Unsupported verification method type: {}", other)),
    }
}

//! Verification key representation transforms.
//!
//! A pure, lossless conversion family over the three interoperable Ed25519
//! representations: `Ed25519VerificationKey2018` (base58-btc),
//! `Ed25519VerificationKey2020` (multibase over the `0xed01` multicodec
//! prefix) and `JsonWebKey2020` (OKP JWK). Off-diagonal conversions go
//! through a raw 32-byte Ed25519 public key; the diagonal is a byte-for-byte
//! passthrough.

use std::str::FromStr;

use crate::document::{DidDocument, VerificationMethod};
use crate::jwk::{JwkError, PublicKeyJwk};

/// Multicodec prefix for an Ed25519 public key.
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

/// The three verification method types of the transform matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRepresentation {
    Ed25519VerificationKey2018,
    Ed25519VerificationKey2020,
    JsonWebKey2020,
}

impl KeyRepresentation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            Self::Ed25519VerificationKey2020 => "Ed25519VerificationKey2020",
            Self::JsonWebKey2020 => "JsonWebKey2020",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported key transform target `{0}`")]
pub struct UnsupportedTarget(pub String);

impl FromStr for KeyRepresentation {
    type Err = UnsupportedTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519VerificationKey2018" => Ok(Self::Ed25519VerificationKey2018),
            "Ed25519VerificationKey2020" => Ok(Self::Ed25519VerificationKey2020),
            "JsonWebKey2020" => Ok(Self::JsonWebKey2020),
            other => Err(UnsupportedTarget(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("verification method `{0}` is missing its key material")]
    MissingKeyMaterial(String),

    #[error("invalid base58 key material: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("invalid multibase key material: {0}")]
    Multibase(#[from] multibase::Error),

    #[error("key material is not an Ed25519 multicodec value")]
    BadMulticodecPrefix,

    #[error(transparent)]
    Jwk(#[from] JwkError),

    #[error("expected a 32-byte Ed25519 public key, found {0} bytes")]
    InvalidKeyLength(usize),
}

fn to_32_bytes(bytes: Vec<u8>) -> Result<[u8; 32], TransformError> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| TransformError::InvalidKeyLength(len))
}

/// Decodes a verification method's key material to the raw Ed25519 key.
fn decode(
    vm: &VerificationMethod,
    source: KeyRepresentation,
) -> Result<[u8; 32], TransformError> {
    let missing = || TransformError::MissingKeyMaterial(vm.id.clone());

    match source {
        KeyRepresentation::Ed25519VerificationKey2018 => {
            let base58 = vm.public_key_base58.as_ref().ok_or_else(missing)?;
            to_32_bytes(bs58::decode(base58).into_vec()?)
        }
        KeyRepresentation::Ed25519VerificationKey2020 => {
            let multibase = vm.public_key_multibase.as_ref().ok_or_else(missing)?;
            let (_, bytes) = multibase::decode(multibase)?;
            let key = bytes
                .strip_prefix(&ED25519_MULTICODEC_PREFIX)
                .ok_or(TransformError::BadMulticodecPrefix)?;
            to_32_bytes(key.to_vec())
        }
        KeyRepresentation::JsonWebKey2020 => {
            let jwk = vm.public_key_jwk.as_ref().ok_or_else(missing)?;
            Ok(jwk.to_ed25519_bytes()?)
        }
    }
}

/// Re-encodes the raw key into `target`, clearing the other key material
/// properties and updating `type`.
fn encode(vm: &mut VerificationMethod, key: [u8; 32], target: KeyRepresentation) {
    vm.type_ = target.type_name().to_string();
    vm.public_key_base58 = None;
    vm.public_key_multibase = None;
    vm.public_key_jwk = None;

    match target {
        KeyRepresentation::Ed25519VerificationKey2018 => {
            vm.public_key_base58 = Some(bs58::encode(key).into_string());
        }
        KeyRepresentation::Ed25519VerificationKey2020 => {
            let mut multicodec = ED25519_MULTICODEC_PREFIX.to_vec();
            multicodec.extend_from_slice(&key);
            vm.public_key_multibase =
                Some(multibase::encode(multibase::Base::Base58Btc, multicodec));
        }
        KeyRepresentation::JsonWebKey2020 => {
            vm.public_key_jwk = Some(PublicKeyJwk::from_ed25519_bytes(&key));
        }
    }
}

/// Transforms one verification method into the target representation.
///
/// Identity transforms (source type equals target) are a no-op. Types
/// outside the matrix are returned unmodified; the per-document policy for
/// those lives in [`transform_document_keys`].
pub fn transform_verification_method(
    vm: &VerificationMethod,
    target: KeyRepresentation,
) -> Result<VerificationMethod, TransformError> {
    let source = match vm.type_.parse::<KeyRepresentation>() {
        Ok(source) => source,
        Err(_) => return Ok(vm.clone()),
    };

    if source == target {
        return Ok(vm.clone());
    }

    let key = decode(vm, source)?;
    let mut out = vm.clone();
    encode(&mut out, key, target);
    Ok(out)
}

/// Applies the transform uniformly to every verification method of a
/// document.
///
/// All-or-nothing: a single entry's failure aborts the whole transform and
/// the document is left untouched. Partial application never happens.
pub fn transform_document_keys(
    document: &mut DidDocument,
    target: KeyRepresentation,
) -> Result<(), TransformError> {
    let transformed = document
        .verification_method
        .iter()
        .map(|vm| transform_verification_method(vm, target))
        .collect::<Result<Vec<_>, _>>()?;

    document.verification_method = transformed;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [
        0x3b, 0x6a, 0x27, 0xbc, 0xce, 0xb6, 0xa4, 0x2d, 0x62, 0xa3, 0xa8, 0xd0, 0x2a, 0x6f, 0x0d,
        0x73, 0x65, 0x32, 0x15, 0x77, 0x1d, 0xe2, 0x43, 0xa6, 0x3a, 0xc0, 0x48, 0xa1, 0x8b, 0x59,
        0xda, 0x29,
    ];

    fn vm_2018() -> VerificationMethod {
        VerificationMethod {
            id: "did:example:testnet:abc#key-1".to_string(),
            type_: "Ed25519VerificationKey2018".to_string(),
            controller: "did:example:testnet:abc".to_string(),
            public_key_base58: Some(bs58::encode(KEY).into_string()),
            public_key_multibase: None,
            public_key_jwk: None,
            property_set: Default::default(),
        }
    }

    #[test]
    fn identity_is_passthrough() {
        let vm = vm_2018();
        let out = transform_verification_method(
            &vm,
            KeyRepresentation::Ed25519VerificationKey2018,
        )
        .unwrap();
        assert_eq!(out, vm);
    }

    #[test]
    fn base58_to_multibase_sets_prefix_and_clears_source() {
        let out = transform_verification_method(
            &vm_2018(),
            KeyRepresentation::Ed25519VerificationKey2020,
        )
        .unwrap();

        assert_eq!(out.type_, "Ed25519VerificationKey2020");
        assert!(out.public_key_base58.is_none());
        assert!(out.public_key_jwk.is_none());

        let multibase = out.public_key_multibase.unwrap();
        assert!(multibase.starts_with('z'));
        let (_, bytes) = multibase::decode(&multibase).unwrap();
        assert_eq!(&bytes[..2], &[0xed, 0x01]);
        assert_eq!(&bytes[2..], &KEY);
    }

    #[test]
    fn base58_to_jwk_and_back_reproduces_original() {
        let original = vm_2018();
        let jwk = transform_verification_method(&original, KeyRepresentation::JsonWebKey2020)
            .unwrap();
        assert_eq!(jwk.type_, "JsonWebKey2020");
        assert!(jwk.public_key_base58.is_none());
        assert_eq!(jwk.public_key_jwk.as_ref().unwrap().crv, "Ed25519");

        let back = transform_verification_method(
            &jwk,
            KeyRepresentation::Ed25519VerificationKey2018,
        )
        .unwrap();
        assert_eq!(back.public_key_base58, original.public_key_base58);
        assert_eq!(back.type_, original.type_);
        assert!(back.public_key_jwk.is_none());
    }

    #[test]
    fn full_matrix_round_trips() {
        use KeyRepresentation::*;
        let original = vm_2018();

        for a in [Ed25519VerificationKey2018, Ed25519VerificationKey2020, JsonWebKey2020] {
            for b in [Ed25519VerificationKey2018, Ed25519VerificationKey2020, JsonWebKey2020] {
                let there = transform_verification_method(&original, a).unwrap();
                let and_back = transform_verification_method(&there, b).unwrap();
                let home = transform_verification_method(
                    &and_back,
                    Ed25519VerificationKey2018,
                )
                .unwrap();
                assert_eq!(home.public_key_base58, original.public_key_base58);
            }
        }
    }

    #[test]
    fn foreign_types_pass_through() {
        let mut vm = vm_2018();
        vm.type_ = "RsaVerificationKey2018".to_string();
        let out =
            transform_verification_method(&vm, KeyRepresentation::JsonWebKey2020).unwrap();
        assert_eq!(out, vm);
    }

    #[test]
    fn document_transform_is_all_or_nothing() {
        let mut doc = DidDocument {
            id: "did:example:testnet:abc".to_string(),
            verification_method: vec![vm_2018(), {
                let mut broken = vm_2018();
                broken.public_key_base58 = Some("!!!not-base58!!!".to_string());
                broken
            }],
            ..Default::default()
        };
        let before = doc.clone();

        let result = transform_document_keys(&mut doc, KeyRepresentation::JsonWebKey2020);
        assert!(result.is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!("RsaVerificationKey2018".parse::<KeyRepresentation>().is_err());
    }
}

//! Minimal JSON Web Key support for Ed25519 verification material.
//!
//! Only the OKP/Ed25519 subset needed by [`JsonWebKey2020`] verification
//! methods is modeled; anything else travels through documents as opaque
//! JSON.
//!
//! [`JsonWebKey2020`]: https://www.w3.org/TR/did-spec-registries/#jsonwebkey2020

use serde::{Deserialize, Serialize};

/// An Ed25519 public key as a JWK (RFC 8037).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    /// Public key bytes, base64url without padding.
    pub x: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JwkError {
    #[error("expected kty `OKP`, found `{0}`")]
    UnexpectedKeyType(String),

    #[error("expected crv `Ed25519`, found `{0}`")]
    UnexpectedCurve(String),

    #[error("invalid base64url key material")]
    Base64(#[from] base64::DecodeError),

    #[error("expected a 32-byte Ed25519 public key, found {0} bytes")]
    InvalidKeyLength(usize),
}

impl PublicKeyJwk {
    /// Encodes a raw 32-byte Ed25519 public key.
    pub fn from_ed25519_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x: base64::encode_config(bytes, base64::URL_SAFE_NO_PAD),
        }
    }

    /// Decodes back to the raw 32-byte Ed25519 public key.
    pub fn to_ed25519_bytes(&self) -> Result<[u8; 32], JwkError> {
        if self.kty != "OKP" {
            return Err(JwkError::UnexpectedKeyType(self.kty.clone()));
        }
        if self.crv != "Ed25519" {
            return Err(JwkError::UnexpectedCurve(self.crv.clone()));
        }
        let bytes = base64::decode_config(&self.x, base64::URL_SAFE_NO_PAD)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| JwkError::InvalidKeyLength(bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_round_trip() {
        let bytes = [7u8; 32];
        let jwk = PublicKeyJwk::from_ed25519_bytes(&bytes);
        assert_eq!(jwk.kty, "OKP");
        assert_eq!(jwk.crv, "Ed25519");
        assert!(!jwk.x.contains('='));
        assert_eq!(jwk.to_ed25519_bytes().unwrap(), bytes);
    }

    #[test]
    fn reject_foreign_key() {
        let jwk = PublicKeyJwk {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: String::new(),
        };
        assert!(matches!(
            jwk.to_ed25519_bytes(),
            Err(JwkError::UnexpectedKeyType(_))
        ));
    }
}

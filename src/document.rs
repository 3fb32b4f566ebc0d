//! DID document data model.
//!
//! See: <https://www.w3.org/TR/did-core/#dfn-did-documents>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jwk::PublicKeyJwk;

/// A [DID document](https://www.w3.org/TR/did-core/#dfn-did-documents).
///
/// `@context` travels in the flattened property set; this resolver never
/// performs JSON-LD processing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// DID subject identifier.
    ///
    /// See: <https://www.w3.org/TR/did-core/#did-subject>
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controller: Vec<String>,

    /// [`verificationMethod`](https://www.w3.org/TR/did-core/#dfn-verificationmethod)
    /// property, expressing verification methods.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<String>,

    /// `service` property, generally endpoints.
    ///
    /// See: <https://www.w3.org/TR/did-core/#services>
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,

    /// Additional properties, including `@context`.
    #[serde(flatten)]
    pub property_set: BTreeMap<String, Value>,
}

impl DidDocument {
    /// Returns the service whose id matches `id`, either exactly or as the
    /// `<did>#<id>` fragment form.
    pub fn select_service(&self, id: &str) -> Option<&Service> {
        self.service
            .iter()
            .find(|s| s.id == id || s.id.ends_with(&format!("#{id}")))
    }

    /// Selects a secondary resource (verification method or service) by
    /// fragment, for DID URL dereferencing.
    ///
    /// See: <https://w3c-ccg.github.io/did-resolution/#dereferencing-algorithm-secondary>
    pub fn select_fragment(&self, fragment: &str) -> Option<Value> {
        let absolute = format!("{}#{fragment}", self.id);

        for vm in &self.verification_method {
            if vm.id == absolute || vm.id == fragment {
                return serde_json::to_value(vm).ok();
            }
        }
        for service in &self.service {
            if service.id == absolute || service.id == fragment {
                return serde_json::to_value(service).ok();
            }
        }

        None
    }
}

/// A [verification method](https://www.w3.org/TR/did-core/#verification-methods).
///
/// Invariant: at most one key material property is populated at any time,
/// matching `type`. The key transform engine relies on this to clear the
/// source property when it sets the destination.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    pub controller: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<PublicKeyJwk>,

    /// Key material of types this resolver does not transform, passed
    /// through unmodified.
    #[serde(flatten)]
    pub property_set: BTreeMap<String, Value>,
}

/// A DID [service](https://www.w3.org/TR/did-core/#services).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    pub service_endpoint: String,

    #[serde(flatten)]
    pub property_set: BTreeMap<String, Value>,
}

//! DID document and resource metadata.
//!
//! See: <https://www.w3.org/TR/did-core/#did-document-metadata>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one version of a DID document.
///
/// Produced by the ledger per version and immutable afterwards. `updated` is
/// absent for a version that was never updated after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDidDocMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,

    pub version_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,

    /// Resources visible from this version, by reference to the collection.
    #[serde(
        rename = "linkedResourceMetadata",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub resources: Vec<DereferencedResource>,
}

impl ResolutionDidDocMetadata {
    /// The instant this version became effective: `updated`, falling back to
    /// `created` for never-updated versions.
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        self.updated.or(self.created)
    }
}

/// The full ordered version list for one DID.
///
/// Insertion order from the ledger is not guaranteed; every consumer goes
/// through [`sort_descending`](Self::sort_descending) first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct DidDocMetadataList(pub Vec<ResolutionDidDocMetadata>);

/// Metadata for one linked resource in a DID's resource collection.
///
/// A resource belongs to exactly one document version at creation time but
/// remains visible across subsequent versions until superseded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DereferencedResource {
    pub resource_uri: String,

    /// The owning DID's method-specific identifier.
    pub collection_id: String,

    pub resource_id: String,

    #[serde(rename = "resourceName")]
    pub name: String,

    pub resource_type: String,

    pub media_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    pub created: DateTime<Utc>,

    pub checksum: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version_id: Option<String>,
}

/// A filterable view over a resource collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct DereferencedResourceList(pub Vec<DereferencedResource>);

impl DereferencedResourceList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

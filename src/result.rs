//! Response value family.
//!
//! [`ResolutionValue`] is the closed set of shapes a request can produce,
//! threaded through the pipeline: transient index variants used mid-chain,
//! terminal envelopes, raw resource bytes and the two redirect forms. The
//! transport layer only ever sees the terminal variants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::content_type::Negotiated;
use crate::did::Did;
use crate::document::DidDocument;
use crate::error::ResolutionError;
use crate::metadata::{
    DereferencedResource, DereferencedResourceList, DidDocMetadataList,
    ResolutionDidDocMetadata,
};
use crate::queries::format_timestamp;

/// JSON-LD context of a DID resolution result envelope.
pub const RESOLUTION_RESULT_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

/// JSON-LD context of a DID URL dereferencing result envelope.
pub const DEREFERENCING_RESULT_CONTEXT: &str = "https://w3id.org/did-url-dereferencing/v1";

/// The `did` property of resolution and dereferencing metadata.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidProperties {
    pub did_string: String,
    pub method_specific_id: String,
    pub method: String,
}

impl From<&Did> for DidProperties {
    fn from(did: &Did) -> Self {
        Self {
            did_string: did.to_string(),
            method_specific_id: format!("{}:{}", did.namespace, did.identifier),
            method: did.method.clone(),
        }
    }
}

/// `didResolutionMetadata` / `dereferencingMetadata` of a success envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub content_type: String,
    pub retrieved: String,
    pub did: DidProperties,
}

impl RequestMetadata {
    fn new(negotiated: &Negotiated, did: &Did, retrieved: DateTime<Utc>) -> Self {
        Self {
            content_type: negotiated.response_content_type(),
            retrieved: format_timestamp(&retrieved),
            did: did.into(),
        }
    }
}

/// Envelope for bare-DID resolution.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionResult {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    pub did_resolution_metadata: RequestMetadata,
    pub did_document: Option<DidDocument>,
    pub did_document_metadata: Option<ResolutionDidDocMetadata>,
}

impl DidResolutionResult {
    pub fn new(
        negotiated: &Negotiated,
        did: &Did,
        retrieved: DateTime<Utc>,
        document: DidDocument,
        metadata: ResolutionDidDocMetadata,
    ) -> Self {
        Self {
            context: negotiated
                .content_type
                .is_ld()
                .then_some(RESOLUTION_RESULT_CONTEXT),
            did_resolution_metadata: RequestMetadata::new(negotiated, did, retrieved),
            did_document: Some(document),
            did_document_metadata: Some(metadata),
        }
    }
}

/// Envelope for DID URL dereferencing (fragments, versions, metadata-only
/// requests and resource metadata).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidDereferencingResult {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    pub dereferencing_metadata: RequestMetadata,
    pub content_stream: Value,
    pub content_metadata: Value,
}

impl DidDereferencingResult {
    pub fn new(
        negotiated: &Negotiated,
        did: &Did,
        retrieved: DateTime<Utc>,
        content_stream: Value,
        content_metadata: Value,
    ) -> Self {
        Self {
            context: negotiated
                .content_type
                .is_ld()
                .then_some(DEREFERENCING_RESULT_CONTEXT),
            dereferencing_metadata: RequestMetadata::new(negotiated, did, retrieved),
            content_stream,
            content_metadata,
        }
    }
}

/// Raw resource payload with its own metadata; served under the resource's
/// `mediaType`, never the negotiated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePayload {
    pub bytes: Vec<u8>,
    pub metadata: DereferencedResource,
}

/// Service endpoint redirect, HTTP 303.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRedirect {
    pub location: String,
}

/// Canonical-identifier redirect for a migrated legacy DID, HTTP 301.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRedirect {
    pub location: String,
}

/// Everything a request can evaluate to.
///
/// The first two variants are transient pipeline state: produced by the
/// fetch handlers, narrowed by the filter handlers and replaced with a
/// terminal variant before the chain ends.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionValue {
    MetadataList(DidDocMetadataList),
    ResourceList(DereferencedResourceList),
    DidResolution(Box<DidResolutionResult>),
    DidDereferencing(Box<DidDereferencingResult>),
    Resource(ResourcePayload),
    ServiceRedirect(ServiceRedirect),
    MigrationRedirect(MigrationRedirect),
}

impl ResolutionValue {
    /// The `Content-Type` the transport layer must answer with, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::DidResolution(result) => {
                Some(result.did_resolution_metadata.content_type.clone())
            }
            Self::DidDereferencing(result) => {
                Some(result.dereferencing_metadata.content_type.clone())
            }
            Self::Resource(payload) => Some(payload.metadata.media_type.clone()),
            Self::ServiceRedirect(_) | Self::MigrationRedirect(_) => None,
            Self::MetadataList(_) | Self::ResourceList(_) => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::ServiceRedirect(_) | Self::MigrationRedirect(_))
    }

    /// The `Location` header value for redirect variants.
    pub fn redirect_location(&self) -> Option<&str> {
        match self {
            Self::ServiceRedirect(redirect) => Some(&redirect.location),
            Self::MigrationRedirect(redirect) => Some(&redirect.location),
            _ => None,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::MigrationRedirect(_) => 301,
            Self::ServiceRedirect(_) => 303,
            _ => 200,
        }
    }

    /// Serializes the response body. Redirects and transient variants have
    /// no body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::DidResolution(result) => serde_json::to_vec(result),
            Self::DidDereferencing(result) => serde_json::to_vec(result),
            Self::Resource(payload) => Ok(payload.bytes.clone()),
            Self::ServiceRedirect(_)
            | Self::MigrationRedirect(_)
            | Self::MetadataList(_)
            | Self::ResourceList(_) => Ok(Vec::new()),
        }
    }

    /// Narrows to the transient metadata list; any other variant is a chain
    /// ordering bug and surfaces as `internalError`.
    pub fn expect_metadata_list(self, did: &Did) -> Result<DidDocMetadataList, ResolutionError> {
        match self {
            Self::MetadataList(list) => Ok(list),
            other => Err(ResolutionError::internal(
                did.to_string(),
                format!("expected a version metadata list, found {}", other.variant_name()),
            )),
        }
    }

    /// Narrows to the transient resource list, like [`Self::expect_metadata_list`].
    pub fn expect_resource_list(
        self,
        did: &Did,
    ) -> Result<DereferencedResourceList, ResolutionError> {
        match self {
            Self::ResourceList(list) => Ok(list),
            other => Err(ResolutionError::internal(
                did.to_string(),
                format!("expected a resource list, found {}", other.variant_name()),
            )),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::MetadataList(_) => "MetadataList",
            Self::ResourceList(_) => "ResourceList",
            Self::DidResolution(_) => "DidResolution",
            Self::DidDereferencing(_) => "DidDereferencing",
            Self::Resource(_) => "Resource",
            Self::ServiceRedirect(_) => "ServiceRedirect",
            Self::MigrationRedirect(_) => "MigrationRedirect",
        }
    }
}

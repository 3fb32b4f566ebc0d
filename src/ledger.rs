//! Ledger access traits.
//!
//! The resolver never talks to a network itself; it is generic over a
//! [`LedgerClient`] supplying document versions, documents and resource data,
//! and an [`IdentifierNormalizer`] mapping legacy identifiers to their
//! canonical form.

use async_trait::async_trait;

use crate::did::Did;
use crate::document::DidDocument;
use crate::metadata::DidDocMetadataList;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The DID, version or resource does not exist on the ledger.
    #[error("not found on ledger")]
    NotFound,

    /// Transport or ledger-side failure.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger returned data the resolver cannot interpret.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),
}

/// Read access to a DID ledger.
///
/// Implementations are expected to be cheap to call repeatedly; the resolver
/// performs at most one call of each kind per request.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns metadata for every version of the DID document, in any order.
    async fn document_versions(&self, did: &Did) -> Result<DidDocMetadataList, LedgerError>;

    /// Returns the document payload for one specific version.
    async fn document(&self, did: &Did, version_id: &str) -> Result<DidDocument, LedgerError>;

    /// Returns the raw payload of a resource within the DID's collection.
    async fn resource_data(&self, did: &Did, resource_id: &str) -> Result<Vec<u8>, LedgerError>;
}

/// Maps legacy identifiers to their canonical form.
///
/// Contract: the result is either the canonical equivalent of `did` or `did`
/// itself, unchanged. Returning an unrelated DID is a bug in the
/// implementation, not a state the resolver defends against.
pub trait IdentifierNormalizer: Send + Sync {
    fn normalize(&self, did: &Did) -> Did;
}

/// Normalizer for ledgers without a legacy identifier scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNormalizer;

impl IdentifierNormalizer for NoopNormalizer {
    fn normalize(&self, did: &Did) -> Did {
        did.clone()
    }
}

//! DID resolution and DID URL dereferencing over a versioned ledger.
//!
//! Implements [DID Resolution][did-resolution] for ledgers that keep every
//! version of a DID document together with a collection of linked resources:
//! bare resolution, fragment and version dereferencing, service endpoint
//! redirects, verification key re-encoding and resource collection queries.
//!
//! The entry point is [`DidResolver`], generic over a [`LedgerClient`]
//! supplying ledger data and an [`IdentifierNormalizer`] mapping legacy
//! identifiers to their canonical form. Requests run through one of two
//! fixed handler chains ([`handlers`]); every request evaluates to a
//! [`ResolutionValue`] or a [`ResolutionError`], both of which know their
//! HTTP representation but leave the transport to the caller.
//!
//! [did-resolution]: https://w3c-ccg.github.io/did-resolution/

pub mod content_type;
pub mod did;
pub mod document;
pub mod error;
pub mod handlers;
mod index;
pub mod jwk;
pub mod ledger;
pub mod metadata;
pub mod pipeline;
pub mod queries;
pub mod resolver;
pub mod result;
pub mod transform;

pub use content_type::{negotiate, ContentType, Negotiated, Profile};
pub use did::{Did, DidUrl, DidUrlPath, InvalidDidUrl};
pub use document::{DidDocument, Service, VerificationMethod};
pub use error::{ErrorKind, ResolutionError};
pub use ledger::{IdentifierNormalizer, LedgerClient, LedgerError, NoopNormalizer};
pub use metadata::{
    DereferencedResource, DereferencedResourceList, DidDocMetadataList,
    ResolutionDidDocMetadata,
};
pub use queries::DidUrlQuery;
pub use resolver::{DidResolver, ResolverConfig};
pub use result::{
    DidDereferencingResult, DidResolutionResult, MigrationRedirect, ResolutionValue,
    ResourcePayload, ServiceRedirect,
};
pub use transform::KeyRepresentation;

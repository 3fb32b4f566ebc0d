//! Concrete pipeline handlers, one query concern each.
//!
//! [`document`] holds the DID-document chain (versions, time selection,
//! services, key transforms, fragments, metadata); [`resource`] the resource
//! collection chain (filters, uniqueness validation, metadata-vs-data).

pub mod document;
pub mod resource;

use crate::error::{ErrorKind, ResolutionError};
use crate::ledger::LedgerError;
use crate::metadata::DidDocMetadataList;
use crate::pipeline::RequestContext;

/// Maps a ledger failure onto the error vocabulary.
fn ledger_error(ctx: &RequestContext<'_>, err: LedgerError) -> ResolutionError {
    match err {
        LedgerError::NotFound => ctx.error(ErrorKind::NotFound),
        other => ctx.internal(other),
    }
}

/// Fetches and sorts the full version list for the request's DID.
///
/// The one ledger round-trip both chains start from; every later narrowing
/// step works on this list in memory.
async fn fetch_version_list(
    ctx: &RequestContext<'_>,
) -> Result<DidDocMetadataList, ResolutionError> {
    let mut list = ctx
        .ledger
        .document_versions(ctx.did())
        .await
        .map_err(|err| ledger_error(ctx, err))?;
    if list.0.is_empty() {
        return Err(ctx.error(ErrorKind::NotFound));
    }
    list.sort_descending();
    Ok(list)
}

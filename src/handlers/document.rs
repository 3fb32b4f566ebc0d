//! The DID-document chain.
//!
//! Order is significant: the version list is materialized first, the version
//! selectors narrow it to one resolved document, and the remaining handlers
//! reshape or short-circuit on that document. The terminal handler returns
//! the accumulated envelope unchanged.

use async_trait::async_trait;
use serde_json::Value;

use crate::did::DidUrlPath;
use crate::error::{ErrorKind, ResolutionError};
use crate::pipeline::{Chain, Flow, Handler, RequestContext};
use crate::queries::parse_timestamp;
use crate::result::{
    DidDereferencingResult, DidResolutionResult, ResolutionValue, ServiceRedirect,
};
use crate::transform::{transform_document_keys, KeyRepresentation};

use super::{fetch_version_list, ledger_error};

/// Builds the document chain in its fixed order.
pub fn document_chain() -> Chain {
    Chain::new(vec![
        Box::new(VersionListHandler),
        Box::new(VersionsPathHandler),
        Box::new(VersionSelectHandler),
        Box::new(ServiceHandler),
        Box::new(TransformKeysHandler),
        Box::new(FragmentHandler),
        Box::new(MetadataHandler),
        Box::new(StopHandler),
    ])
}

fn expect_resolution(
    ctx: &RequestContext<'_>,
    current: Option<ResolutionValue>,
) -> Result<Box<DidResolutionResult>, ResolutionError> {
    match current {
        Some(ResolutionValue::DidResolution(resolution)) => Ok(resolution),
        _ => Err(ctx.internal("expected a resolved document at this point of the chain")),
    }
}

/// Materializes the sorted version list. The only ledger list fetch of the
/// chain.
struct VersionListHandler;

#[async_trait]
impl Handler for VersionListHandler {
    fn name(&self) -> &'static str {
        "version-list"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        _: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let list = fetch_version_list(ctx).await?;
        Ok(Flow::Continue(Some(ResolutionValue::MetadataList(list))))
    }
}

/// `/versions`: the whole sorted list as a dereferencing content stream.
struct VersionsPathHandler;

#[async_trait]
impl Handler for VersionsPathHandler {
    fn name(&self) -> &'static str {
        "versions-path"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        if ctx.did_url.path != DidUrlPath::Versions {
            return Ok(Flow::Continue(current));
        }

        let list = current
            .ok_or_else(|| ctx.internal("version list missing"))?
            .expect_metadata_list(ctx.did())?;
        let stream = serde_json::to_value(&list).map_err(|err| ctx.internal(err))?;
        Ok(Flow::Break(ResolutionValue::DidDereferencing(Box::new(
            DidDereferencingResult::new(ctx.negotiated, ctx.did(), ctx.retrieved, stream, Value::Null),
        ))))
    }
}

/// Selects the target version (`versionId`, `versionTime` or latest) and
/// resolves it into a full document envelope.
///
/// The selected version's metadata carries the resource collection as it was
/// at that version.
struct VersionSelectHandler;

#[async_trait]
impl Handler for VersionSelectHandler {
    fn name(&self) -> &'static str {
        "version-select"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let list = current
            .ok_or_else(|| ctx.internal("version list missing"))?
            .expect_metadata_list(ctx.did())?;

        let target = if let Some(version_id) = &ctx.query.version_id {
            list.find_by_version_id(version_id)
                .ok_or_else(|| ctx.error(ErrorKind::NotFound))?
        } else if let Some(raw) = &ctx.query.version_time {
            let time = parse_timestamp(raw).map_err(|err| ctx.internal(err))?;
            list.find_active_for_time(time)
                .ok_or_else(|| ctx.error(ErrorKind::NotFound))?
        } else {
            list.0
                .first()
                .ok_or_else(|| ctx.internal("empty version list"))?
        };

        let mut metadata = target.clone();
        metadata.resources = list.resources_before_next_version(&metadata.version_id).0;

        let document = ctx
            .ledger
            .document(ctx.did(), &metadata.version_id)
            .await
            .map_err(|err| ledger_error(ctx, err))?;

        Ok(Flow::Continue(Some(ResolutionValue::DidResolution(Box::new(
            DidResolutionResult::new(ctx.negotiated, ctx.did(), ctx.retrieved, document, metadata),
        )))))
    }
}

/// `service=` redirect, with optional literal `relativeRef` concatenation.
struct ServiceHandler;

#[async_trait]
impl Handler for ServiceHandler {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let service_id = match &ctx.query.service {
            Some(service_id) => service_id,
            None => return Ok(Flow::Continue(current)),
        };

        let resolution = expect_resolution(ctx, current)?;
        let document = resolution
            .did_document
            .as_ref()
            .ok_or_else(|| ctx.internal("resolved envelope without a document"))?;
        let service = document
            .select_service(service_id)
            .ok_or_else(|| ctx.error(ErrorKind::NotFound))?;

        let mut location = service.service_endpoint.clone();
        if let Some(relative_ref) = &ctx.query.relative_ref {
            location.push_str(relative_ref);
        }
        Ok(Flow::Break(ResolutionValue::ServiceRedirect(ServiceRedirect {
            location,
        })))
    }
}

/// `transformKeys=`: uniform key re-encoding over the resolved document.
struct TransformKeysHandler;

#[async_trait]
impl Handler for TransformKeysHandler {
    fn name(&self) -> &'static str {
        "transform-keys"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let target_raw = match &ctx.query.transform_keys {
            Some(target_raw) => target_raw,
            None => return Ok(Flow::Continue(current)),
        };
        let target: KeyRepresentation = target_raw
            .parse()
            .map_err(|_| ctx.error(ErrorKind::RepresentationNotSupported))?;

        let mut resolution = expect_resolution(ctx, current)?;
        if let Some(document) = resolution.did_document.as_mut() {
            // Malformed key material came off the ledger, not the request.
            transform_document_keys(document, target).map_err(|err| ctx.internal(err))?;
        }
        Ok(Flow::Continue(Some(ResolutionValue::DidResolution(resolution))))
    }
}

/// Fragment dereferencing over the (possibly transformed) document.
struct FragmentHandler;

#[async_trait]
impl Handler for FragmentHandler {
    fn name(&self) -> &'static str {
        "fragment"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let fragment = match &ctx.did_url.fragment {
            Some(fragment) => fragment,
            None => return Ok(Flow::Continue(current)),
        };

        let resolution = expect_resolution(ctx, current)?;
        let document = resolution
            .did_document
            .as_ref()
            .ok_or_else(|| ctx.internal("resolved envelope without a document"))?;
        let stream = document
            .select_fragment(fragment)
            .ok_or_else(|| ctx.error(ErrorKind::NotFound))?;
        let content_metadata = serde_json::to_value(&resolution.did_document_metadata)
            .map_err(|err| ctx.internal(err))?;

        Ok(Flow::Break(ResolutionValue::DidDereferencing(Box::new(
            DidDereferencingResult::new(
                ctx.negotiated,
                ctx.did(),
                ctx.retrieved,
                stream,
                content_metadata,
            ),
        ))))
    }
}

/// `metadata=true`: document metadata only, no document body.
struct MetadataHandler;

#[async_trait]
impl Handler for MetadataHandler {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        if ctx.query.metadata != Some(true) {
            return Ok(Flow::Continue(current));
        }

        let resolution = expect_resolution(ctx, current)?;
        let stream = serde_json::to_value(&resolution.did_document_metadata)
            .map_err(|err| ctx.internal(err))?;

        Ok(Flow::Break(ResolutionValue::DidDereferencing(Box::new(
            DidDereferencingResult::new(ctx.negotiated, ctx.did(), ctx.retrieved, stream, Value::Null),
        ))))
    }
}

/// Terminal: returns the accumulated envelope unchanged.
struct StopHandler;

#[async_trait]
impl Handler for StopHandler {
    fn name(&self) -> &'static str {
        "stop"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        match current {
            Some(value) => Ok(Flow::Break(value)),
            None => Err(ctx.internal("chain produced no result")),
        }
    }
}

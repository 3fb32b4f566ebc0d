//! The resource collection chain.
//!
//! Collection lookup first, then one filter handler per query parameter,
//! then cross-filter uniqueness validation, then the metadata-vs-data
//! branch. The terminal state is exactly one resource; an ambiguous
//! remainder is `notFound`, never "pick the first".

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::content_type::Profile;
use crate::did::DidUrlPath;
use crate::error::{ErrorKind, ResolutionError};
use crate::metadata::DereferencedResourceList;
use crate::pipeline::{Chain, Flow, Handler, RequestContext};
use crate::queries::parse_timestamp;
use crate::result::{DidDereferencingResult, ResolutionValue, ResourcePayload};

use super::{fetch_version_list, ledger_error};

/// Builds the resource chain in its fixed order.
pub fn resource_chain() -> Chain {
    Chain::new(vec![
        Box::new(CollectionHandler),
        Box::new(AllResourcesHandler),
        Box::new(CollectionIdHandler),
        Box::new(ResourceIdHandler),
        Box::new(NameHandler),
        Box::new(TypeHandler),
        Box::new(VersionHandler),
        Box::new(VersionTimeHandler),
        Box::new(ChecksumHandler),
        Box::new(ValidationHandler),
        Box::new(MetadataBranchHandler),
        Box::new(DataHandler),
    ])
}

fn expect_list(
    ctx: &RequestContext<'_>,
    current: Option<ResolutionValue>,
) -> Result<DereferencedResourceList, ResolutionError> {
    current
        .ok_or_else(|| ctx.internal("resource list missing"))?
        .expect_resource_list(ctx.did())
}

fn non_empty(
    ctx: &RequestContext<'_>,
    list: DereferencedResourceList,
) -> Result<Flow, ResolutionError> {
    if list.is_empty() {
        return Err(ctx.error(ErrorKind::NotFound));
    }
    Ok(Flow::Continue(Some(ResolutionValue::ResourceList(list))))
}

/// Materializes the DID's whole resource collection from the version list.
struct CollectionHandler;

#[async_trait]
impl Handler for CollectionHandler {
    fn name(&self) -> &'static str {
        "resource-collection"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        _: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let versions = fetch_version_list(ctx).await?;
        Ok(Flow::Continue(Some(ResolutionValue::ResourceList(
            versions.all_resources(),
        ))))
    }
}

/// `/resources/all`: collection metadata, possibly empty, never an error.
struct AllResourcesHandler;

#[async_trait]
impl Handler for AllResourcesHandler {
    fn name(&self) -> &'static str {
        "all-resources"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        if ctx.did_url.path != DidUrlPath::AllResources {
            return Ok(Flow::Continue(current));
        }

        let list = expect_list(ctx, current)?;
        let stream = json!({ "linkedResourceMetadata": list });
        Ok(Flow::Break(ResolutionValue::DidDereferencing(Box::new(
            DidDereferencingResult::new(ctx.negotiated, ctx.did(), ctx.retrieved, stream, Value::Null),
        ))))
    }
}

struct CollectionIdHandler;

#[async_trait]
impl Handler for CollectionIdHandler {
    fn name(&self) -> &'static str {
        "resource-collection-id"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let collection_id = match &ctx.query.resource_collection_id {
            Some(collection_id) => collection_id,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.filter_by_collection_id(collection_id))
    }
}

struct ResourceIdHandler;

#[async_trait]
impl Handler for ResourceIdHandler {
    fn name(&self) -> &'static str {
        "resource-id"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let resource_id = match &ctx.query.resource_id {
            Some(resource_id) => resource_id,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        let resource = list
            .get_by_resource_id(resource_id)
            .ok_or_else(|| ctx.error(ErrorKind::NotFound))?;
        Ok(Flow::Continue(Some(ResolutionValue::ResourceList(
            DereferencedResourceList(vec![resource.clone()]),
        ))))
    }
}

struct NameHandler;

#[async_trait]
impl Handler for NameHandler {
    fn name(&self) -> &'static str {
        "resource-name"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let name = match &ctx.query.resource_name {
            Some(name) => name,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.filter_by_resource_name(name))
    }
}

struct TypeHandler;

#[async_trait]
impl Handler for TypeHandler {
    fn name(&self) -> &'static str {
        "resource-type"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let resource_type = match &ctx.query.resource_type {
            Some(resource_type) => resource_type,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.filter_by_resource_type(resource_type))
    }
}

struct VersionHandler;

#[async_trait]
impl Handler for VersionHandler {
    fn name(&self) -> &'static str {
        "resource-version"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let version = match &ctx.query.resource_version {
            Some(version) => version,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.filter_by_resource_version(version))
    }
}

/// `resourceVersionTime=`: resources created at or before the given instant.
struct VersionTimeHandler;

#[async_trait]
impl Handler for VersionTimeHandler {
    fn name(&self) -> &'static str {
        "resource-version-time"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let raw = match &ctx.query.resource_version_time {
            Some(raw) => raw,
            None => return Ok(Flow::Continue(current)),
        };
        let time = parse_timestamp(raw).map_err(|err| ctx.internal(err))?;
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.find_all_before_time(time))
    }
}

struct ChecksumHandler;

#[async_trait]
impl Handler for ChecksumHandler {
    fn name(&self) -> &'static str {
        "resource-checksum"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let checksum = match &ctx.query.checksum {
            Some(checksum) => checksum,
            None => return Ok(Flow::Continue(current)),
        };
        let list = expect_list(ctx, current)?;
        non_empty(ctx, list.filter_by_checksum(checksum))
    }
}

/// Narrows the filtered list to exactly one resource.
///
/// Several survivors are acceptable only when they are versions of the same
/// resource (uniform name and type); the most recent one wins. Mixed
/// survivors mean the query was ambiguous.
struct ValidationHandler;

#[async_trait]
impl Handler for ValidationHandler {
    fn name(&self) -> &'static str {
        "resource-validation"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let mut list = expect_list(ctx, current)?;
        if list.is_empty() {
            return Err(ctx.error(ErrorKind::NotFound));
        }
        if list.len() > 1 {
            if !list.are_resource_names_the_same() || !list.are_resource_types_the_same() {
                return Err(ctx.error(ErrorKind::NotFound));
            }
            list.sort_descending();
            list.0.truncate(1);
        }
        Ok(Flow::Continue(Some(ResolutionValue::ResourceList(list))))
    }
}

/// `resourceMetadata=true` (and the `/metadata` path form): metadata only.
struct MetadataBranchHandler;

#[async_trait]
impl Handler for MetadataBranchHandler {
    fn name(&self) -> &'static str {
        "resource-metadata"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        // `resourceMetadata=false` cannot be combined with the dereferencing
        // profile; the profile mandates metadata.
        if ctx.query.resource_metadata == Some(false)
            && ctx.negotiated.profile == Some(Profile::DidUrlDereferencing)
        {
            return Err(ctx.error(ErrorKind::InvalidDidUrl));
        }
        if ctx.query.resource_metadata != Some(true) {
            return Ok(Flow::Continue(current));
        }

        let list = expect_list(ctx, current)?;
        let stream = json!({ "linkedResourceMetadata": list });
        Ok(Flow::Break(ResolutionValue::DidDereferencing(Box::new(
            DidDereferencingResult::new(ctx.negotiated, ctx.did(), ctx.retrieved, stream, Value::Null),
        ))))
    }
}

/// Terminal: fetches the single surviving resource's raw bytes.
struct DataHandler;

#[async_trait]
impl Handler for DataHandler {
    fn name(&self) -> &'static str {
        "resource-data"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError> {
        let list = expect_list(ctx, current)?;
        let metadata = match list.0.as_slice() {
            [resource] => resource.clone(),
            _ => return Err(ctx.internal("resource chain ended without a single resource")),
        };

        let bytes = ctx
            .ledger
            .resource_data(ctx.did(), &metadata.resource_id)
            .await
            .map_err(|err| ledger_error(ctx, err))?;
        Ok(Flow::Break(ResolutionValue::Resource(ResourcePayload {
            bytes,
            metadata,
        })))
    }
}

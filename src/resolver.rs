//! The resolver entry point.
//!
//! Wires configuration, the ledger client, the identifier normalizer and the
//! two handler chains together. Chains are composed once at construction and
//! shared read-only across requests; all request state lives on the stack of
//! [`DidResolver::resolve`].

use chrono::{DateTime, Utc};

use crate::content_type::negotiate;
use crate::did::{DidUrl, DidUrlPath, InvalidDidUrl};
use crate::error::{ErrorKind, ResolutionError};
use crate::handlers::{document::document_chain, resource::resource_chain};
use crate::ledger::{IdentifierNormalizer, LedgerClient, NoopNormalizer};
use crate::pipeline::{Chain, RequestContext};
use crate::queries::DidUrlQuery;
use crate::result::{MigrationRedirect, ResolutionValue};

/// Static resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// DID methods this resolver answers for. Empty allows any method.
    pub methods: Vec<String>,
    /// Ledger namespaces this resolver answers for. Empty allows any.
    pub namespaces: Vec<String>,
    /// Path prefix for `Location` values of migration redirects.
    pub base_path: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            namespaces: Vec::new(),
            base_path: "/1.0/identifiers/".to_string(),
        }
    }
}

impl ResolverConfig {
    fn allows_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m == method)
    }

    fn allows_namespace(&self, namespace: &str) -> bool {
        self.namespaces.is_empty() || self.namespaces.iter().any(|n| n == namespace)
    }
}

/// A DID resolver over one ledger.
pub struct DidResolver<L, N = NoopNormalizer> {
    config: ResolverConfig,
    ledger: L,
    normalizer: N,
    clock: fn() -> DateTime<Utc>,
    document_chain: Chain,
    resource_chain: Chain,
}

impl<L: LedgerClient> DidResolver<L> {
    pub fn new(config: ResolverConfig, ledger: L) -> Self {
        Self::with_normalizer(config, ledger, NoopNormalizer)
    }
}

impl<L: LedgerClient, N: IdentifierNormalizer> DidResolver<L, N> {
    pub fn with_normalizer(config: ResolverConfig, ledger: L, normalizer: N) -> Self {
        Self {
            config,
            ledger,
            normalizer,
            clock: Utc::now,
            document_chain: document_chain(),
            resource_chain: resource_chain(),
        }
    }

    /// Replaces the wall clock used for the `retrieved` envelope timestamp.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolves a DID URL under the given `Accept` header.
    ///
    /// Request validation happens strictly before any ledger access:
    /// representation negotiation, DID URL syntax, method and namespace
    /// allow-lists, identifier shape, then the query compatibility matrix.
    pub async fn resolve(
        &self,
        did_url: &str,
        accept: Option<&str>,
    ) -> Result<ResolutionValue, ResolutionError> {
        let result = self.resolve_inner(did_url, accept).await;
        if let Err(err) = &result {
            log::debug!(
                "{did_url}: {} ({})",
                err.kind,
                err.detail.as_deref().unwrap_or("no detail")
            );
        }
        result
    }

    async fn resolve_inner(
        &self,
        did_url: &str,
        accept: Option<&str>,
    ) -> Result<ResolutionValue, ResolutionError> {
        let negotiated = negotiate(accept).ok_or_else(|| {
            ResolutionError::new(ErrorKind::RepresentationNotSupported, did_url)
        })?;
        let fail = |kind| ResolutionError::new(kind, did_url).with_negotiated(negotiated);

        let url: DidUrl = did_url.parse().map_err(|err: InvalidDidUrl| {
            let kind = match &err {
                InvalidDidUrl::Did(..) => ErrorKind::InvalidDid,
                InvalidDidUrl::Url(..) => ErrorKind::InvalidDidUrl,
            };
            fail(kind).with_detail(err.to_string())
        })?;

        if !self.config.allows_method(&url.did.method) {
            return Err(fail(ErrorKind::MethodNotSupported));
        }
        if !self.config.allows_namespace(&url.did.namespace) {
            return Err(fail(ErrorKind::InvalidDid).with_detail("namespace not allowed"));
        }
        if url.did.identifier_kind().is_none() {
            return Err(fail(ErrorKind::InvalidDidUrl).with_detail("unrecognized identifier shape"));
        }

        let mut query = match &url.query {
            Some(raw) => DidUrlQuery::parse(raw)
                .map_err(|err| fail(ErrorKind::InvalidDidUrl).with_detail(err.to_string()))?,
            None => DidUrlQuery::default(),
        };
        fold_path(&url.path, &mut query)
            .map_err(|detail| fail(ErrorKind::InvalidDidUrl).with_detail(detail))?;
        query
            .validate()
            .map_err(|err| fail(ErrorKind::InvalidDidUrl).with_detail(err.to_string()))?;
        if url.fragment.is_some() && query.has_resource_params() {
            return Err(fail(ErrorKind::InvalidDidUrl)
                .with_detail("fragment combined with resource query parameters"));
        }

        let dereferencing = url.is_dereferencing()
            || query.has_resource_params()
            || query.metadata == Some(true);

        let canonical = self.normalizer.normalize(&url.did);
        if canonical != url.did {
            let target = DidUrl {
                did: canonical,
                ..url.clone()
            };
            log::info!("{}: migrated identifier, redirecting to {target}", url.did);
            return Ok(ResolutionValue::MigrationRedirect(MigrationRedirect {
                location: format!("{}{target}", self.config.base_path),
            }));
        }

        let chain = if url.path.is_resource() || query.has_resource_params() {
            &self.resource_chain
        } else {
            &self.document_chain
        };

        let ctx = RequestContext {
            did_url: &url,
            query: &query,
            negotiated: &negotiated,
            dereferencing,
            ledger: &self.ledger,
            retrieved: (self.clock)(),
        };
        chain.run(&ctx).await
    }
}

/// Folds the path forms into their query equivalents so each chain handler
/// owns a single parameter. A path form clashing with an equivalent query
/// parameter is malformed.
fn fold_path(path: &DidUrlPath, query: &mut DidUrlQuery) -> Result<(), &'static str> {
    fn set<T>(slot: &mut Option<T>, value: T, clash: &'static str) -> Result<(), &'static str> {
        if slot.is_some() {
            return Err(clash);
        }
        *slot = Some(value);
        Ok(())
    }

    match path {
        DidUrlPath::None => Ok(()),
        // The listing paths answer for the whole collection. Parameters that
        // would select within it have nothing to act on and are malformed.
        DidUrlPath::Versions | DidUrlPath::AllResources => {
            if *query != DidUrlQuery::default() {
                return Err("listing path does not take query parameters");
            }
            Ok(())
        }
        DidUrlPath::Version(id) => set(
            &mut query.version_id,
            id.clone(),
            "version path combined with versionId",
        ),
        DidUrlPath::VersionMetadata(id) => {
            set(
                &mut query.version_id,
                id.clone(),
                "version path combined with versionId",
            )?;
            set(
                &mut query.metadata,
                true,
                "version metadata path combined with metadata",
            )
        }
        DidUrlPath::Resource(id) => set(
            &mut query.resource_id,
            id.clone(),
            "resource path combined with resourceId",
        ),
        DidUrlPath::ResourceMetadata(id) => {
            set(
                &mut query.resource_id,
                id.clone(),
                "resource path combined with resourceId",
            )?;
            set(
                &mut query.resource_metadata,
                true,
                "resource metadata path combined with resourceMetadata",
            )
        }
    }
}

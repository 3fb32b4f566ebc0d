//! Chain-of-responsibility pipeline.
//!
//! A [`Chain`] is an explicit ordered list of [`Handler`]s, composed once at
//! startup and shared read-only across requests. Each handler owns exactly
//! one query concern: if its parameter is absent it passes the current value
//! through untouched, otherwise it filters, transforms or fetches and either
//! continues or short-circuits. All per-request state travels as the threaded
//! [`ResolutionValue`]; handlers hold none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::content_type::Negotiated;
use crate::did::{Did, DidUrl};
use crate::error::{ErrorKind, ResolutionError};
use crate::ledger::LedgerClient;
use crate::queries::DidUrlQuery;
use crate::result::ResolutionValue;

/// Per-request, read-only context shared by every handler in a chain.
pub struct RequestContext<'a> {
    pub did_url: &'a DidUrl,
    pub query: &'a DidUrlQuery,
    pub negotiated: &'a Negotiated,
    /// Authoritative mode for error envelopes.
    pub dereferencing: bool,
    pub ledger: &'a dyn LedgerClient,
    /// Single per-request timestamp, stamped into every envelope.
    pub retrieved: DateTime<Utc>,
}

impl RequestContext<'_> {
    pub fn did(&self) -> &Did {
        &self.did_url.did
    }

    /// Builds an error carrying this request's DID, representation and mode.
    pub fn error(&self, kind: ErrorKind) -> ResolutionError {
        ResolutionError::new(kind, self.did_url.to_string())
            .with_negotiated(*self.negotiated)
            .dereferencing(self.dereferencing)
    }

    pub fn internal(&self, detail: impl ToString) -> ResolutionError {
        self.error(ErrorKind::InternalError)
            .with_detail(detail.to_string())
    }
}

/// A handler's verdict: defer to the next handler (with a possibly replaced
/// value) or end the chain with a terminal value.
pub enum Flow {
    Continue(Option<ResolutionValue>),
    Break(ResolutionValue),
}

#[async_trait]
pub trait Handler: Send + Sync {
    /// Name used in trace logging.
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        current: Option<ResolutionValue>,
    ) -> Result<Flow, ResolutionError>;
}

/// A fixed, ordered handler list driven front to back.
pub struct Chain {
    handlers: Vec<Box<dyn Handler>>,
}

impl Chain {
    pub fn new(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self { handlers }
    }

    /// Runs the chain. The first error aborts it; a chain that runs out of
    /// handlers without producing a value is a composition bug.
    pub async fn run(&self, ctx: &RequestContext<'_>) -> Result<ResolutionValue, ResolutionError> {
        let mut current = None;
        for handler in &self.handlers {
            log::trace!("{}: running handler {}", ctx.did_url, handler.name());
            match handler.handle(ctx, current).await? {
                Flow::Continue(next) => current = next,
                Flow::Break(value) => return Ok(value),
            }
        }
        current.ok_or_else(|| ctx.internal("handler chain ended without a result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::Negotiated;
    use crate::document::DidDocument;
    use crate::ledger::LedgerError;
    use crate::metadata::DidDocMetadataList;

    struct EmptyLedger;

    #[async_trait]
    impl LedgerClient for EmptyLedger {
        async fn document_versions(&self, _: &Did) -> Result<DidDocMetadataList, LedgerError> {
            Err(LedgerError::NotFound)
        }
        async fn document(&self, _: &Did, _: &str) -> Result<DidDocument, LedgerError> {
            Err(LedgerError::NotFound)
        }
        async fn resource_data(&self, _: &Did, _: &str) -> Result<Vec<u8>, LedgerError> {
            Err(LedgerError::NotFound)
        }
    }

    struct Seed;

    #[async_trait]
    impl Handler for Seed {
        fn name(&self) -> &'static str {
            "seed"
        }
        async fn handle(
            &self,
            _: &RequestContext<'_>,
            _: Option<ResolutionValue>,
        ) -> Result<Flow, ResolutionError> {
            Ok(Flow::Continue(Some(ResolutionValue::MetadataList(
                DidDocMetadataList(Vec::new()),
            ))))
        }
    }

    struct Stop;

    #[async_trait]
    impl Handler for Stop {
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
                None => Err(ctx.internal("nothing to return")),
            }
        }
    }

    struct Fail;

    #[async_trait]
    impl Handler for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }
        async fn handle(
            &self,
            ctx: &RequestContext<'_>,
            _: Option<ResolutionValue>,
        ) -> Result<Flow, ResolutionError> {
            Err(ctx.error(ErrorKind::NotFound))
        }
    }

    struct Fixture {
        did_url: DidUrl,
        query: DidUrlQuery,
        negotiated: Negotiated,
        ledger: EmptyLedger,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                did_url: "did:example:testnet:c82f2b02-bdab-4dd7-b833-3e143745d612"
                    .parse()
                    .unwrap(),
                query: DidUrlQuery::default(),
                negotiated: Negotiated::default(),
                ledger: EmptyLedger,
            }
        }

        fn context(&self) -> RequestContext<'_> {
            RequestContext {
                did_url: &self.did_url,
                query: &self.query,
                negotiated: &self.negotiated,
                dereferencing: false,
                ledger: &self.ledger,
                retrieved: Utc::now(),
            }
        }
    }

    #[tokio::test]
    async fn value_threads_through_to_the_terminal_handler() {
        let fixture = Fixture::new();
        let chain = Chain::new(vec![Box::new(Seed), Box::new(Stop)]);
        let value = chain.run(&fixture.context()).await.unwrap();
        assert!(matches!(value, ResolutionValue::MetadataList(_)));
    }

    #[tokio::test]
    async fn first_error_aborts_the_chain() {
        let fixture = Fixture::new();
        let chain = Chain::new(vec![Box::new(Seed), Box::new(Fail), Box::new(Stop)]);
        let err = chain.run(&fixture.context()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn empty_handed_chain_is_an_internal_error() {
        let fixture = Fixture::new();
        let chain = Chain::new(vec![]);
        let err = chain.run(&fixture.context()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }
}

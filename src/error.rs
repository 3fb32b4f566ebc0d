//! Resolution and dereferencing errors.
//!
//! Every failure surfaces as a [`ResolutionError`] carrying enough context to
//! render an error envelope: the error value from the fixed vocabulary of
//! the [DID Specification Registries][registries], the DID, the negotiated
//! representation and the resolution-vs-dereferencing mode.
//!
//! [registries]: https://www.w3.org/TR/did-spec-registries/#error

use serde_json::{json, Value};

use crate::content_type::Negotiated;

/// Error vocabulary for DID Resolution and DID URL dereferencing.
///
/// The `Display` form is the registered error value, used verbatim in the
/// `error` metadata property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorKind {
    /// [`invalidDid`](https://www.w3.org/TR/did-spec-registries/#invaliddid):
    /// malformed method or namespace.
    #[error("invalidDid")]
    InvalidDid,

    /// [`invalidDidUrl`](https://www.w3.org/TR/did-spec-registries/#invaliddidurl):
    /// malformed query combination or identifier shape.
    #[error("invalidDidUrl")]
    InvalidDidUrl,

    /// [`notFound`](https://www.w3.org/TR/did-spec-registries/#notfound):
    /// well-formed request with no matching version, resource or service.
    #[error("notFound")]
    NotFound,

    /// [`representationNotSupported`](https://www.w3.org/TR/did-spec-registries/#representationnotsupported):
    /// negotiation failure or unsupported key transform target.
    #[error("representationNotSupported")]
    RepresentationNotSupported,

    /// `methodNotSupported`: DID method mismatch.
    #[error("methodNotSupported")]
    MethodNotSupported,

    /// `internalError`: upstream failure, parse failure or invariant
    /// violation.
    #[error("internalError")]
    InternalError,
}

impl ErrorKind {
    /// The HTTP status this error maps to at the transport boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidDid | Self::InvalidDidUrl => 400,
            Self::NotFound => 404,
            Self::RepresentationNotSupported => 406,
            Self::InternalError => 500,
            Self::MethodNotSupported => 501,
        }
    }
}

/// A terminal resolution or dereferencing failure.
///
/// Never retried. The envelope shape (resolution vs dereferencing) is
/// preserved on error so clients see the same body layout for success and
/// failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} while handling `{did}`")]
pub struct ResolutionError {
    pub kind: ErrorKind,
    /// The DID (or DID URL) the request was about.
    pub did: String,
    /// The negotiated representation the error body must use.
    pub negotiated: Negotiated,
    /// True when the failing operation was a dereference.
    pub dereferencing: bool,
    /// Internal detail, logged but never serialized into the envelope.
    pub detail: Option<String>,
}

impl ResolutionError {
    pub fn new(kind: ErrorKind, did: impl Into<String>) -> Self {
        Self {
            kind,
            did: did.into(),
            negotiated: Negotiated::default(),
            dereferencing: false,
            detail: None,
        }
    }

    pub fn with_negotiated(mut self, negotiated: Negotiated) -> Self {
        self.negotiated = negotiated;
        self
    }

    pub fn dereferencing(mut self, dereferencing: bool) -> Self {
        self.dereferencing = dereferencing;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Creates a new internal error.
    pub fn internal(did: impl Into<String>, detail: impl ToString) -> Self {
        Self::new(ErrorKind::InternalError, did).with_detail(detail.to_string())
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// Renders the error body.
    ///
    /// The body mirrors the success envelope of the failing mode: a
    /// `didResolutionMetadata` envelope for resolution, a
    /// `dereferencingMetadata` envelope for dereferencing, with the document
    /// and metadata properties present but null.
    pub fn to_envelope(&self) -> Value {
        let metadata = json!({
            "error": self.kind.to_string(),
            "contentType": self.negotiated.response_content_type(),
            "did": { "didString": self.did },
        });

        if self.dereferencing {
            json!({
                "@context": crate::result::DEREFERENCING_RESULT_CONTEXT,
                "dereferencingMetadata": metadata,
                "contentStream": null,
                "contentMetadata": null,
            })
        } else {
            json!({
                "@context": crate::result::RESOLUTION_RESULT_CONTEXT,
                "didResolutionMetadata": metadata,
                "didDocument": null,
                "didDocumentMetadata": null,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorKind::InvalidDid.http_status(), 400);
        assert_eq!(ErrorKind::InvalidDidUrl.http_status(), 400);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::RepresentationNotSupported.http_status(), 406);
        assert_eq!(ErrorKind::InternalError.http_status(), 500);
        assert_eq!(ErrorKind::MethodNotSupported.http_status(), 501);
    }

    #[test]
    fn envelope_shape_follows_mode() {
        let err = ResolutionError::new(ErrorKind::NotFound, "did:example:testnet:abc");
        let body = err.to_envelope();
        assert_eq!(body["didResolutionMetadata"]["error"], "notFound");
        assert!(body["didDocument"].is_null());

        let body = err.dereferencing(true).to_envelope();
        assert_eq!(body["dereferencingMetadata"]["error"], "notFound");
        assert!(body["contentStream"].is_null());
    }
}

//! Representation media types and `Accept` header negotiation.
//!
//! See: <https://www.w3.org/TR/did-core/#representations>

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Profile URI selecting the DID Resolution Result envelope.
pub const PROFILE_DID_RESOLUTION: &str = "https://w3id.org/did-resolution";
/// Profile URI selecting the DID URL Dereferencing envelope.
pub const PROFILE_DID_URL_DEREFERENCING: &str = "https://w3id.org/did-url-dereferencing";

/// DID document representation media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// `application/did+json`.
    #[serde(rename = "application/did+json")]
    DidJson,

    /// `application/did+ld+json`.
    #[serde(rename = "application/did+ld+json")]
    DidLdJson,

    /// `application/ld+json`, optionally profiled with
    /// [`PROFILE_DID_RESOLUTION`] or [`PROFILE_DID_URL_DEREFERENCING`].
    #[serde(rename = "application/ld+json")]
    LdJson,
}

impl ContentType {
    /// Returns the name of the media type, without parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DidJson => "application/did+json",
            Self::DidLdJson => "application/did+ld+json",
            Self::LdJson => "application/ld+json",
        }
    }

    /// True for the JSON-LD representations, which carry an `@context`.
    pub fn is_ld(&self) -> bool {
        matches!(self, Self::DidLdJson | Self::LdJson)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::DidLdJson
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown DID document representation `{0}`")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application/did+json" => Ok(Self::DidJson),
            "application/did+ld+json" => Ok(Self::DidLdJson),
            "application/ld+json" => Ok(Self::LdJson),
            unknown => Err(UnknownContentType(unknown.to_string())),
        }
    }
}

/// Envelope profile requested through the `profile` media type parameter of
/// `application/ld+json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// `https://w3id.org/did-resolution`.
    DidResolution,
    /// `https://w3id.org/did-url-dereferencing`.
    DidUrlDereferencing,
}

impl Profile {
    pub fn uri(&self) -> &'static str {
        match self {
            Self::DidResolution => PROFILE_DID_RESOLUTION,
            Self::DidUrlDereferencing => PROFILE_DID_URL_DEREFERENCING,
        }
    }
}

/// Outcome of `Accept` negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub content_type: ContentType,
    pub profile: Option<Profile>,
}

impl Default for Negotiated {
    fn default() -> Self {
        Self {
            content_type: ContentType::default(),
            profile: None,
        }
    }
}

impl Negotiated {
    /// The `Content-Type` value of the response, including the profile
    /// parameter when one was negotiated.
    pub fn response_content_type(&self) -> String {
        match self.profile {
            Some(profile) => format!("{};profile=\"{}\"", self.content_type, profile.uri()),
            None => self.content_type.to_string(),
        }
    }
}

/// One parsed media range of an `Accept` header.
struct MediaRange<'a> {
    type_: &'a str,
    q: f32,
    profile: Option<&'a str>,
}

fn parse_media_range(range: &str) -> MediaRange<'_> {
    let mut parts = range.split(';');
    let type_ = parts.next().unwrap_or_default().trim();
    let mut q = 1.0;
    let mut profile = None;

    for param in parts {
        match param.trim().split_once('=') {
            Some(("q", value)) => q = value.trim().parse().unwrap_or(1.0),
            Some(("profile", value)) => profile = Some(value.trim().trim_matches('"')),
            _ => {}
        }
    }

    MediaRange { type_, q, profile }
}

/// Selects the response representation for an `Accept` header.
///
/// Media ranges are considered in descending `q` order (stable for equal
/// weights). The `profile` parameter is stripped for type matching but
/// retained to pick the resolution or dereferencing envelope when the base
/// type is `application/ld+json`. An absent or wildcard header selects the
/// default representation. Returns `None` when no offered type is supported;
/// callers map this to `representationNotSupported` without touching the
/// ledger.
pub fn negotiate(accept: Option<&str>) -> Option<Negotiated> {
    let accept = match accept {
        None | Some("") => return Some(Negotiated::default()),
        Some(accept) => accept,
    };

    let mut ranges: Vec<MediaRange> = accept.split(',').map(parse_media_range).collect();
    ranges.sort_by(|a, b| b.q.partial_cmp(&a.q).unwrap_or(std::cmp::Ordering::Equal));

    for range in ranges {
        if range.type_ == "*/*" {
            return Some(Negotiated::default());
        }
        if let Ok(content_type) = range.type_.parse::<ContentType>() {
            let profile = match (content_type, range.profile) {
                (ContentType::LdJson, Some(PROFILE_DID_RESOLUTION)) => {
                    Some(Profile::DidResolution)
                }
                (ContentType::LdJson, Some(PROFILE_DID_URL_DEREFERENCING)) => {
                    Some(Profile::DidUrlDereferencing)
                }
                _ => None,
            };
            return Some(Negotiated {
                content_type,
                profile,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_defaults() {
        assert_eq!(negotiate(None), Some(Negotiated::default()));
        assert_eq!(negotiate(Some("*/*")), Some(Negotiated::default()));
        assert_eq!(
            negotiate(Some("text/html, */*;q=0.1")),
            Some(Negotiated::default())
        );
    }

    #[test]
    fn negotiate_by_weight() {
        let negotiated =
            negotiate(Some("application/did+json;q=0.5, application/did+ld+json")).unwrap();
        assert_eq!(negotiated.content_type, ContentType::DidLdJson);

        let negotiated =
            negotiate(Some("application/did+json, application/did+ld+json;q=0.2")).unwrap();
        assert_eq!(negotiated.content_type, ContentType::DidJson);
    }

    #[test]
    fn negotiate_profile() {
        let negotiated = negotiate(Some(
            "application/ld+json;profile=\"https://w3id.org/did-resolution\"",
        ))
        .unwrap();
        assert_eq!(negotiated.content_type, ContentType::LdJson);
        assert_eq!(negotiated.profile, Some(Profile::DidResolution));
        assert_eq!(
            negotiated.response_content_type(),
            "application/ld+json;profile=\"https://w3id.org/did-resolution\""
        );

        let negotiated = negotiate(Some(
            "application/ld+json;profile=\"https://w3id.org/did-url-dereferencing\"",
        ))
        .unwrap();
        assert_eq!(negotiated.profile, Some(Profile::DidUrlDereferencing));
    }

    #[test]
    fn negotiate_unsupported() {
        assert_eq!(negotiate(Some("text/html")), None);
        assert_eq!(negotiate(Some("application/xml, text/plain;q=0.9")), None);
    }
}

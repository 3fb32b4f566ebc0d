//! DID and DID URL syntax.
//!
//! As specified by [Decentralized Identifiers (DIDs) v1.0][did-core],
//! restricted to the ledger method shape `did:<method>:<namespace>:<id>`.
//!
//! [did-core]: https://www.w3.org/TR/did-core/

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error raised when a conversion to a [`Did`] or [`DidUrl`] fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDidUrl {
    #[error("invalid DID `{0}`: {1}")]
    Did(String, &'static str),

    #[error("invalid DID URL `{0}`: {1}")]
    Url(String, &'static str),
}

/// A parsed ledger DID: `did:<method>:<namespace>:<identifier>`.
///
/// The method and namespace are validated against the resolver configuration
/// separately; this type only enforces the DID syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Did {
    pub method: String,
    pub namespace: String,
    pub identifier: String,
}

/// Shape of a method-specific identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// 16-byte base58-btc identifier (legacy Indy style).
    IndyStyle16,
    /// 32-byte base58-btc identifier (legacy Indy style).
    IndyStyle32,
    /// UUID identifier, canonical form.
    Uuid,
}

impl Did {
    fn is_method_char(b: u8) -> bool {
        matches!(b, b'a'..=b'z') || b.is_ascii_digit()
    }

    fn is_namespace_char(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'-'
    }

    fn is_id_char(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_')
    }

    /// Returns the shape of the method-specific identifier, if it is one of
    /// the recognized shapes.
    ///
    /// Identifiers that are neither 16/32-byte base58 nor UUIDs are not
    /// resolvable and map to `invalidDidUrl` at the request boundary.
    pub fn identifier_kind(&self) -> Option<IdentifierKind> {
        if let Ok(bytes) = bs58::decode(&self.identifier).into_vec() {
            match bytes.len() {
                16 => return Some(IdentifierKind::IndyStyle16),
                32 => return Some(IdentifierKind::IndyStyle32),
                _ => {}
            }
        }

        if uuid::Uuid::parse_str(&self.identifier).is_ok() && self.identifier.len() == 36 {
            return Some(IdentifierKind::Uuid);
        }

        None
    }
}

impl FromStr for Did {
    type Err = InvalidDidUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |msg| InvalidDidUrl::Did(s.to_string(), msg);

        let rest = s.strip_prefix("did:").ok_or_else(|| err("missing `did:` scheme"))?;

        let mut parts = rest.splitn(3, ':');
        let method = parts.next().unwrap_or_default();
        let namespace = parts.next().ok_or_else(|| err("missing namespace"))?;
        let identifier = parts.next().ok_or_else(|| err("missing identifier"))?;

        if method.is_empty() || !method.bytes().all(Self::is_method_char) {
            return Err(err("malformed method name"));
        }
        if namespace.is_empty() || !namespace.bytes().all(Self::is_namespace_char) {
            return Err(err("malformed namespace"));
        }
        if identifier.is_empty() || !identifier.bytes().all(Self::is_id_char) {
            return Err(err("malformed identifier"));
        }

        Ok(Did {
            method: method.to_string(),
            namespace: namespace.to_string(),
            identifier: identifier.to_string(),
        })
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}:{}", self.method, self.namespace, self.identifier)
    }
}

impl Serialize for Did {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The path component of a DID URL, reduced to the shapes this resolver
/// dereferences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DidUrlPath {
    /// No path: bare DID resolution.
    #[default]
    None,
    /// `/versions`: list all document versions.
    Versions,
    /// `/version/{versionId}`: resolve a specific version.
    Version(String),
    /// `/version/{versionId}/metadata`: metadata of a specific version.
    VersionMetadata(String),
    /// `/resources/all`: metadata for the whole resource collection.
    AllResources,
    /// `/resources/{resourceId}`: raw resource data.
    Resource(String),
    /// `/resources/{resourceId}/metadata`: metadata for one resource.
    ResourceMetadata(String),
}

impl DidUrlPath {
    /// True for the resource-collection path forms.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Self::AllResources | Self::Resource(_) | Self::ResourceMetadata(_)
        )
    }
}

/// A DID URL: a [`Did`] with optional path, query and fragment.
///
/// See: <https://www.w3.org/TR/did-core/#did-url-syntax>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidUrl {
    pub did: Did,
    pub path: DidUrlPath,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl DidUrl {
    /// True when this URL must be handled in dereferencing mode rather than
    /// resolution mode: any fragment, resource path or version path.
    pub fn is_dereferencing(&self) -> bool {
        self.fragment.is_some() || self.path != DidUrlPath::None
    }
}

impl FromStr for DidUrl {
    type Err = InvalidDidUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |msg| InvalidDidUrl::Url(s.to_string(), msg);

        let (rest, fragment) = match s.split_once('#') {
            Some((_, frag)) if frag.is_empty() => {
                return Err(InvalidDidUrl::Url(s.to_string(), "empty fragment"))
            }
            Some((rest, frag)) => (rest, Some(frag.to_string())),
            None => (s, None),
        };

        let (rest, query) = match rest.split_once('?') {
            Some((rest, q)) => (rest, Some(q.to_string())),
            None => (rest, None),
        };

        let (did_str, path) = match rest.split_once('/') {
            Some((did_str, path)) => (did_str, parse_path(path).ok_or_else(|| err("unsupported path"))?),
            None => (rest, DidUrlPath::None),
        };

        if path != DidUrlPath::None && fragment.is_some() {
            return Err(err("fragment not allowed on a path form"));
        }

        Ok(DidUrl {
            did: did_str.parse()?,
            path,
            query,
            fragment,
        })
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.did.fmt(f)?;
        match &self.path {
            DidUrlPath::None => {}
            DidUrlPath::Versions => write!(f, "/versions")?,
            DidUrlPath::Version(v) => write!(f, "/version/{v}")?,
            DidUrlPath::VersionMetadata(v) => write!(f, "/version/{v}/metadata")?,
            DidUrlPath::AllResources => write!(f, "/resources/all")?,
            DidUrlPath::Resource(r) => write!(f, "/resources/{r}")?,
            DidUrlPath::ResourceMetadata(r) => write!(f, "/resources/{r}/metadata")?,
        }
        if let Some(q) = &self.query {
            write!(f, "?{q}")?;
        }
        if let Some(frag) = &self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

fn parse_path(path: &str) -> Option<DidUrlPath> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["versions"] => Some(DidUrlPath::Versions),
        ["version", id] if !id.is_empty() => Some(DidUrlPath::Version(id.to_string())),
        ["version", id, "metadata"] if !id.is_empty() => {
            Some(DidUrlPath::VersionMetadata(id.to_string()))
        }
        ["resources", "all"] => Some(DidUrlPath::AllResources),
        ["resources", id] if !id.is_empty() => Some(DidUrlPath::Resource(id.to_string())),
        ["resources", id, "metadata"] if !id.is_empty() => {
            Some(DidUrlPath::ResourceMetadata(id.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID_DID: &str = "did:example:testnet:c7070cbf-9e87-45b9-8d8a-a61e15232670";

    #[test]
    fn parse_did_accept() {
        let did: Did = UUID_DID.parse().unwrap();
        assert_eq!(did.method, "example");
        assert_eq!(did.namespace, "testnet");
        assert_eq!(did.identifier_kind(), Some(IdentifierKind::Uuid));

        // base58 of 16 bytes (0xa0..0xb0), 22 characters
        let did: Did = "did:example:mainnet:LqTT3d9tPF8RJqfzmsVnhC".parse().unwrap();
        assert_eq!(did.identifier_kind(), Some(IdentifierKind::IndyStyle16));

        // base58 of 32 bytes (0x00..0x20), leading zero byte preserved
        let did: Did = "did:example:mainnet:1thX6LZfHDZZKUs92febYZhYRcXddmzfzF2NvTkPNE"
            .parse()
            .unwrap();
        assert_eq!(did.identifier_kind(), Some(IdentifierKind::IndyStyle32));

        // decodes to 17 bytes, which is not a recognized shape
        let did: Did = "did:example:mainnet:zF7rhDBfUt9d1gJPjx7s1J".parse().unwrap();
        assert_eq!(did.identifier_kind(), None);
    }

    #[test]
    fn parse_did_reject() {
        for input in [
            "http:a:b",
            "did::b",
            "did:a:",
            "did:example:testnet",
            "did:EXAMPLE:testnet:abc",
            "did:example:test net:abc",
        ] {
            assert!(input.parse::<Did>().is_err(), "{input}");
        }
    }

    #[test]
    fn parse_did_url_shapes() {
        let url: DidUrl = format!("{UUID_DID}/resources/all").parse().unwrap();
        assert_eq!(url.path, DidUrlPath::AllResources);
        assert!(url.is_dereferencing());

        let url: DidUrl = format!("{UUID_DID}/version/42/metadata").parse().unwrap();
        assert_eq!(url.path, DidUrlPath::VersionMetadata("42".to_string()));

        let url: DidUrl = format!("{UUID_DID}?versionId=42#key-1").parse().unwrap();
        assert_eq!(url.query.as_deref(), Some("versionId=42"));
        assert_eq!(url.fragment.as_deref(), Some("key-1"));

        let url: DidUrl = UUID_DID.parse().unwrap();
        assert!(!url.is_dereferencing());
    }

    #[test]
    fn parse_did_url_reject() {
        assert!(format!("{UUID_DID}/bogus").parse::<DidUrl>().is_err());
        assert!(format!("{UUID_DID}#").parse::<DidUrl>().is_err());
        assert!(format!("{UUID_DID}/versions#frag").parse::<DidUrl>().is_err());
    }
}

//! DID URL query parsing and the parameter compatibility matrix.
//!
//! Every recognized query parameter lands in a typed [`DidUrlQuery`]; any
//! other name is rejected up front. [`DidUrlQuery::validate`] enforces the
//! fixed pairwise incompatibility table before any ledger work happens.

use chrono::{DateTime, SecondsFormat, Utc};

pub const PARAM_VERSION_ID: &str = "versionId";
pub const PARAM_VERSION_TIME: &str = "versionTime";
pub const PARAM_SERVICE: &str = "service";
pub const PARAM_RELATIVE_REF: &str = "relativeRef";
pub const PARAM_METADATA: &str = "metadata";
pub const PARAM_TRANSFORM_KEYS: &str = "transformKeys";
pub const PARAM_RESOURCE_ID: &str = "resourceId";
pub const PARAM_RESOURCE_COLLECTION_ID: &str = "resourceCollectionId";
pub const PARAM_RESOURCE_NAME: &str = "resourceName";
pub const PARAM_RESOURCE_TYPE: &str = "resourceType";
pub const PARAM_RESOURCE_VERSION: &str = "resourceVersion";
pub const PARAM_RESOURCE_VERSION_TIME: &str = "resourceVersionTime";
pub const PARAM_RESOURCE_METADATA: &str = "resourceMetadata";
pub const PARAM_CHECKSUM: &str = "checksum";

/// The resource-query family. Version, metadata, service and transform
/// parameters are all incompatible with it.
const RESOURCE_PARAMS: [&str; 8] = [
    PARAM_RESOURCE_ID,
    PARAM_RESOURCE_COLLECTION_ID,
    PARAM_RESOURCE_NAME,
    PARAM_RESOURCE_TYPE,
    PARAM_RESOURCE_VERSION,
    PARAM_RESOURCE_VERSION_TIME,
    PARAM_RESOURCE_METADATA,
    PARAM_CHECKSUM,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("malformed query string")]
    Malformed,

    #[error("unsupported query parameter `{0}`")]
    UnsupportedParameter(String),

    #[error("duplicate query parameter `{0}`")]
    DuplicateParameter(String),

    #[error("query parameter `{0}` must be `true` or `false`")]
    InvalidFlag(String),

    #[error("query parameters `{0}` and `{1}` cannot be combined")]
    IncompatibleParameters(&'static str, &'static str),

    #[error("`relativeRef` requires a `service` parameter")]
    DanglingRelativeRef,
}

/// Typed view of a DID URL's query component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DidUrlQuery {
    pub version_id: Option<String>,
    pub version_time: Option<String>,
    pub service: Option<String>,
    pub relative_ref: Option<String>,
    pub metadata: Option<bool>,
    pub transform_keys: Option<String>,
    pub resource_id: Option<String>,
    pub resource_collection_id: Option<String>,
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
    pub resource_version: Option<String>,
    pub resource_version_time: Option<String>,
    pub resource_metadata: Option<bool>,
    pub checksum: Option<String>,
}

fn set_string(
    slot: &mut Option<String>,
    name: &str,
    value: String,
) -> Result<(), QueryError> {
    if slot.is_some() {
        return Err(QueryError::DuplicateParameter(name.to_string()));
    }
    *slot = Some(value);
    Ok(())
}

fn set_flag(slot: &mut Option<bool>, name: &str, value: &str) -> Result<(), QueryError> {
    if slot.is_some() {
        return Err(QueryError::DuplicateParameter(name.to_string()));
    }
    *slot = Some(
        value
            .parse::<bool>()
            .map_err(|_| QueryError::InvalidFlag(name.to_string()))?,
    );
    Ok(())
}

impl DidUrlQuery {
    /// Parses a raw query string, rejecting unknown and duplicated names.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(raw).map_err(|_| QueryError::Malformed)?;

        let mut query = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                PARAM_VERSION_ID => set_string(&mut query.version_id, &name, value)?,
                PARAM_VERSION_TIME => set_string(&mut query.version_time, &name, value)?,
                PARAM_SERVICE => set_string(&mut query.service, &name, value)?,
                PARAM_RELATIVE_REF => set_string(&mut query.relative_ref, &name, value)?,
                PARAM_METADATA => set_flag(&mut query.metadata, &name, &value)?,
                PARAM_TRANSFORM_KEYS => set_string(&mut query.transform_keys, &name, value)?,
                PARAM_RESOURCE_ID => set_string(&mut query.resource_id, &name, value)?,
                PARAM_RESOURCE_COLLECTION_ID => {
                    set_string(&mut query.resource_collection_id, &name, value)?
                }
                PARAM_RESOURCE_NAME => set_string(&mut query.resource_name, &name, value)?,
                PARAM_RESOURCE_TYPE => set_string(&mut query.resource_type, &name, value)?,
                PARAM_RESOURCE_VERSION => {
                    set_string(&mut query.resource_version, &name, value)?
                }
                PARAM_RESOURCE_VERSION_TIME => {
                    set_string(&mut query.resource_version_time, &name, value)?
                }
                PARAM_RESOURCE_METADATA => {
                    set_flag(&mut query.resource_metadata, &name, &value)?
                }
                PARAM_CHECKSUM => set_string(&mut query.checksum, &name, value)?,
                other => return Err(QueryError::UnsupportedParameter(other.to_string())),
            }
        }
        Ok(query)
    }

    fn is_set(&self, name: &'static str) -> bool {
        match name {
            PARAM_VERSION_ID => self.version_id.is_some(),
            PARAM_VERSION_TIME => self.version_time.is_some(),
            PARAM_SERVICE => self.service.is_some(),
            PARAM_RELATIVE_REF => self.relative_ref.is_some(),
            PARAM_METADATA => self.metadata.is_some(),
            PARAM_TRANSFORM_KEYS => self.transform_keys.is_some(),
            PARAM_RESOURCE_ID => self.resource_id.is_some(),
            PARAM_RESOURCE_COLLECTION_ID => self.resource_collection_id.is_some(),
            PARAM_RESOURCE_NAME => self.resource_name.is_some(),
            PARAM_RESOURCE_TYPE => self.resource_type.is_some(),
            PARAM_RESOURCE_VERSION => self.resource_version.is_some(),
            PARAM_RESOURCE_VERSION_TIME => self.resource_version_time.is_some(),
            PARAM_RESOURCE_METADATA => self.resource_metadata.is_some(),
            PARAM_CHECKSUM => self.checksum.is_some(),
            _ => false,
        }
    }

    /// True when any parameter of the resource-query family is present.
    pub fn has_resource_params(&self) -> bool {
        RESOURCE_PARAMS.iter().any(|name| self.is_set(name))
    }

    /// Enforces the pairwise incompatibility table.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.relative_ref.is_some() && self.service.is_none() {
            return Err(QueryError::DanglingRelativeRef);
        }

        let mut incompatible: Vec<(&'static str, &'static str)> = Vec::new();
        for resource in RESOURCE_PARAMS {
            incompatible.push((PARAM_VERSION_ID, resource));
            incompatible.push((PARAM_VERSION_TIME, resource));
            incompatible.push((PARAM_METADATA, resource));
            incompatible.push((PARAM_SERVICE, resource));
            incompatible.push((PARAM_TRANSFORM_KEYS, resource));
        }
        incompatible.push((PARAM_VERSION_ID, PARAM_RELATIVE_REF));
        incompatible.push((PARAM_VERSION_TIME, PARAM_RELATIVE_REF));
        incompatible.push((PARAM_METADATA, PARAM_RELATIVE_REF));
        incompatible.push((PARAM_VERSION_ID, PARAM_VERSION_TIME));
        incompatible.push((PARAM_TRANSFORM_KEYS, PARAM_METADATA));

        for (a, b) in incompatible {
            if self.is_set(a) && self.is_set(b) {
                return Err(QueryError::IncompatibleParameters(a, b));
            }
        }
        Ok(())
    }
}

/// Parses a query timestamp, accepting RFC 3339 with or without fractional
/// seconds. Returned in UTC, fractional part preserved.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

/// Formats a timestamp the way the envelopes emit them.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

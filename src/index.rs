//! Version and resource selection algorithms.
//!
//! Everything here is pure, in-memory list processing over the version and
//! resource metadata a single ledger fetch produced. The canonical ordering
//! every handler relies on is "latest first": descending by `updated`, with
//! versions lacking an `updated` timestamp sorting after (older than) any
//! version that has one.

use chrono::{DateTime, Utc};

use crate::metadata::{
    DereferencedResource, DereferencedResourceList, DidDocMetadataList, ResolutionDidDocMetadata,
};

impl DidDocMetadataList {
    /// Sorts the list descending by `updated`, nil-`updated` entries last.
    ///
    /// The sort is stable: the relative order of entries with equal (or both
    /// absent) timestamps is preserved.
    pub fn sort_descending(&mut self) {
        self.0.sort_by(|a, b| b.updated.cmp(&a.updated));
    }

    /// Exact `versionId` lookup.
    pub fn find_by_version_id(&self, version_id: &str) -> Option<&ResolutionDidDocMetadata> {
        self.0.iter().find(|v| v.version_id == version_id)
    }

    /// Returns the version that was active at `time`: the latest entry whose
    /// effective timestamp (`updated`, or `created` when never updated) is at
    /// or before the queried instant. Not the nearest in either direction.
    ///
    /// When two versions share an effective timestamp the lexicographically
    /// higher `versionId` wins, keeping the result independent of input
    /// order. Idempotent under re-sorting.
    pub fn find_active_for_time(&self, time: DateTime<Utc>) -> Option<&ResolutionDidDocMetadata> {
        self.0
            .iter()
            .filter(|v| v.effective_time().is_some_and(|t| t <= time))
            .max_by(|a, b| {
                a.effective_time()
                    .cmp(&b.effective_time())
                    .then_with(|| a.version_id.cmp(&b.version_id))
            })
    }

    /// Reconstructs the resource collection visible at the given historical
    /// version: resources attached to versions up to and including that
    /// version's effective-time boundary, most recent version first.
    pub fn resources_before_next_version(&self, version_id: &str) -> DereferencedResourceList {
        let boundary = match self
            .find_by_version_id(version_id)
            .and_then(|v| v.effective_time())
        {
            Some(boundary) => boundary,
            None => return DereferencedResourceList::default(),
        };

        let mut sorted = self.clone();
        sorted.sort_descending();

        let mut resources: Vec<DereferencedResource> = Vec::new();
        for version in sorted
            .0
            .iter()
            .filter(|v| v.effective_time().is_some_and(|t| t <= boundary))
        {
            for resource in &version.resources {
                if !resources.iter().any(|r| r.resource_id == resource.resource_id) {
                    resources.push(resource.clone());
                }
            }
        }
        DereferencedResourceList(resources)
    }

    /// Flattens the full resource collection across all versions, most
    /// recent version first, deduplicated by `resourceId`.
    ///
    /// A resource is attached to the version metadata of every version it is
    /// visible from; the collection contains each resource once.
    pub fn all_resources(&self) -> DereferencedResourceList {
        let mut sorted = self.clone();
        sorted.sort_descending();

        let mut resources: Vec<DereferencedResource> = Vec::new();
        for version in &sorted.0 {
            for resource in &version.resources {
                if !resources.iter().any(|r| r.resource_id == resource.resource_id) {
                    resources.push(resource.clone());
                }
            }
        }

        DereferencedResourceList(resources)
    }
}

impl DereferencedResourceList {
    fn filter(&self, keep: impl Fn(&DereferencedResource) -> bool) -> Self {
        Self(self.0.iter().filter(|r| keep(r)).cloned().collect())
    }

    pub fn filter_by_collection_id(&self, collection_id: &str) -> Self {
        self.filter(|r| r.collection_id == collection_id)
    }

    pub fn filter_by_resource_name(&self, name: &str) -> Self {
        self.filter(|r| r.name == name)
    }

    pub fn filter_by_resource_type(&self, resource_type: &str) -> Self {
        self.filter(|r| r.resource_type == resource_type)
    }

    pub fn filter_by_checksum(&self, checksum: &str) -> Self {
        self.filter(|r| r.checksum == checksum)
    }

    pub fn filter_by_resource_version(&self, version: &str) -> Self {
        self.filter(|r| r.resource_version.as_deref() == Some(version))
    }

    pub fn get_by_resource_id(&self, resource_id: &str) -> Option<&DereferencedResource> {
        self.0.iter().find(|r| r.resource_id == resource_id)
    }

    /// Resources created at or before `time`, same `<=` semantics as
    /// [`DidDocMetadataList::find_active_for_time`].
    pub fn find_all_before_time(&self, time: DateTime<Utc>) -> Self {
        self.filter(|r| r.created <= time)
    }

    /// True when every entry shares the same resource name.
    pub fn are_resource_names_the_same(&self) -> bool {
        self.0
            .windows(2)
            .all(|pair| pair[0].name == pair[1].name)
    }

    /// True when every entry shares the same resource type.
    pub fn are_resource_types_the_same(&self) -> bool {
        self.0
            .windows(2)
            .all(|pair| pair[0].resource_type == pair[1].resource_type)
    }

    /// Sorts descending by `created`, newest first.
    pub fn sort_descending(&mut self) {
        self.0.sort_by(|a, b| b.created.cmp(&a.created));
    }
}

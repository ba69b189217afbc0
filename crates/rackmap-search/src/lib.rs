//! Global search catalogue.
//!
//! The catalogue is a hand-assembled, ordered list of searchable types
//! keyed by type name, grouped per application section. It is built once
//! at startup and drives the search surface: a query fans out over the
//! catalogue in insertion order, and each type contributes at most
//! [`SEARCH_MAX_RESULTS`] hits.

use rackmap_model::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-type cap on search hits.
pub const SEARCH_MAX_RESULTS: usize = 15;

/// Application sections, in catalogue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSection {
    /// Data-centre infrastructure.
    Dcim,
    /// Tenancy.
    Tenancy,
    /// Virtualisation.
    Virtualization,
    /// Extras (tags, config contexts).
    Extras,
}

impl SearchSection {
    /// Human-readable section heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dcim => "DCIM",
            Self::Tenancy => "Tenancy",
            Self::Virtualization => "Virtualization",
            Self::Extras => "Extras",
        }
    }
}

/// One searchable type: its name, display label, section, and the list
/// view it links back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    /// Type name used in search requests (`site`, `device`, ...).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Section the type is grouped under.
    pub section: SearchSection,
    /// List view URL for "see all" links.
    pub list_url: &'static str,
}

/// A single matching record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the matching record.
    pub object_id: Uuid,
    /// Display title, typically the record name.
    pub title: String,
}

/// The hits a single catalogue entry contributed to a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTypeResults {
    /// Type name.
    pub name: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Section heading.
    pub section: &'static str,
    /// List view URL.
    pub list_url: &'static str,
    /// Matching records, capped at [`SEARCH_MAX_RESULTS`].
    pub hits: Vec<SearchHit>,
}

/// Ordered catalogue of searchable types.
#[derive(Debug, Clone)]
pub struct SearchCatalog {
    entries: Vec<SearchEntry>,
}

impl SearchCatalog {
    /// Assemble the built-in catalogue, section by section.
    #[must_use]
    pub fn builtin() -> Self {
        let mut entries = Vec::new();

        for kind in [
            EntityKind::Region,
            EntityKind::SiteGroup,
            EntityKind::Site,
            EntityKind::DeviceType,
            EntityKind::DeviceRole,
            EntityKind::Platform,
        ] {
            entries.push(entity_entry(kind, SearchSection::Dcim));
        }
        entries.push(SearchEntry {
            name: "device",
            label: "Device",
            section: SearchSection::Dcim,
            list_url: "/api/dcim/devices",
        });

        for kind in [EntityKind::TenantGroup, EntityKind::Tenant] {
            entries.push(entity_entry(kind, SearchSection::Tenancy));
        }

        for kind in [
            EntityKind::ClusterType,
            EntityKind::ClusterGroup,
            EntityKind::Cluster,
        ] {
            entries.push(entity_entry(kind, SearchSection::Virtualization));
        }

        entries.push(entity_entry(EntityKind::Tag, SearchSection::Extras));
        entries.push(SearchEntry {
            name: "configcontext",
            label: "Config context",
            section: SearchSection::Extras,
            list_url: "/api/extras/config-contexts",
        });

        Self { entries }
    }

    /// Look up an entry by type name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SearchEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// True when the catalogue knows the type name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate entries in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchEntry> {
        self.entries.iter()
    }

    /// Number of catalogued types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SearchCatalog {
    type Item = &'a SearchEntry;
    type IntoIter = std::slice::Iter<'a, SearchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

const fn entity_entry(kind: EntityKind, section: SearchSection) -> SearchEntry {
    let (label, list_url) = match kind {
        EntityKind::Region => ("Region", "/api/entities?kind=region"),
        EntityKind::SiteGroup => ("Site group", "/api/entities?kind=sitegroup"),
        EntityKind::Site => ("Site", "/api/entities?kind=site"),
        EntityKind::DeviceType => ("Device type", "/api/entities?kind=devicetype"),
        EntityKind::DeviceRole => ("Device role", "/api/entities?kind=devicerole"),
        EntityKind::Platform => ("Platform", "/api/entities?kind=platform"),
        EntityKind::ClusterType => ("Cluster type", "/api/entities?kind=clustertype"),
        EntityKind::ClusterGroup => ("Cluster group", "/api/entities?kind=clustergroup"),
        EntityKind::Cluster => ("Cluster", "/api/entities?kind=cluster"),
        EntityKind::TenantGroup => ("Tenant group", "/api/entities?kind=tenantgroup"),
        EntityKind::Tenant => ("Tenant", "/api/entities?kind=tenant"),
        EntityKind::Tag => ("Tag", "/api/entities?kind=tag"),
    };
    SearchEntry {
        name: kind.as_str(),
        label,
        section,
        list_url,
    }
}

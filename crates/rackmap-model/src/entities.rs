//! Organisational entities referenced by scope assignments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;

/// The kinds of organisational records a scope dimension can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Geographic region grouping sites.
    Region,
    /// Functional grouping of sites.
    SiteGroup,
    /// Physical site.
    Site,
    /// Hardware model of a device.
    DeviceType,
    /// Functional role assigned to a device.
    DeviceRole,
    /// Operating platform running on a device.
    Platform,
    /// Technology backing a virtualisation cluster.
    ClusterType,
    /// Administrative grouping of clusters.
    ClusterGroup,
    /// Virtualisation cluster.
    Cluster,
    /// Grouping of tenants.
    TenantGroup,
    /// Tenant owning or operating infrastructure.
    Tenant,
    /// Free-form tag.
    Tag,
}

impl EntityKind {
    /// Every kind, in catalogue order.
    pub const ALL: [Self; 12] = [
        Self::Region,
        Self::SiteGroup,
        Self::Site,
        Self::DeviceType,
        Self::DeviceRole,
        Self::Platform,
        Self::ClusterType,
        Self::ClusterGroup,
        Self::Cluster,
        Self::TenantGroup,
        Self::Tenant,
        Self::Tag,
    ];

    /// Stable lowercase label used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::SiteGroup => "sitegroup",
            Self::Site => "site",
            Self::DeviceType => "devicetype",
            Self::DeviceRole => "devicerole",
            Self::Platform => "platform",
            Self::ClusterType => "clustertype",
            Self::ClusterGroup => "clustergroup",
            Self::Cluster => "cluster",
            Self::TenantGroup => "tenantgroup",
            Self::Tenant => "tenant",
            Self::Tag => "tag",
        }
    }

    /// Application the kind belongs to, mirroring the model census.
    #[must_use]
    pub const fn app_label(self) -> &'static str {
        match self {
            Self::Region
            | Self::SiteGroup
            | Self::Site
            | Self::DeviceType
            | Self::DeviceRole
            | Self::Platform => "dcim",
            Self::ClusterType | Self::ClusterGroup | Self::Cluster => "virtualization",
            Self::TenantGroup | Self::Tenant => "tenancy",
            Self::Tag => "extras",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ModelError::UnknownEntityKind {
                value: value.to_string(),
            })
    }
}

/// An organisational record a scope assignment can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier.
    pub id: Uuid,
    /// Kind discriminator.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// URL-safe identifier, unique per kind.
    pub slug: String,
}

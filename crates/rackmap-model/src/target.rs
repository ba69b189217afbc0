//! Devices and the scope attributes they present for context matching.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::ContextData;

/// The attributes a device presents when matched against scope
/// assignments.
///
/// Hierarchical dimensions (regions, site groups, tenant groups) are
/// explicit lists: a target lists every ancestor it should match under,
/// since tree expansion is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetScope {
    /// Region lineage.
    pub regions: Vec<Uuid>,
    /// Site group lineage.
    pub site_groups: Vec<Uuid>,
    /// Assigned site.
    pub site: Option<Uuid>,
    /// Hardware type.
    pub device_type: Option<Uuid>,
    /// Functional role.
    pub role: Option<Uuid>,
    /// Operating platform.
    pub platform: Option<Uuid>,
    /// Cluster technology, for virtualisation hosts.
    pub cluster_type: Option<Uuid>,
    /// Cluster group, for virtualisation hosts.
    pub cluster_group: Option<Uuid>,
    /// Cluster membership.
    pub cluster: Option<Uuid>,
    /// Tenant group lineage.
    pub tenant_groups: Vec<Uuid>,
    /// Owning tenant.
    pub tenant: Option<Uuid>,
    /// Assigned tags.
    pub tags: BTreeSet<Uuid>,
}

/// A device record: the canonical context target.
///
/// `local_context_data`, when present, is merged last during resolution
/// and overrides every inherited value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Scope attributes used for context matching.
    pub scope: TargetScope,
    /// Optional local override document.
    pub local_context_data: Option<ContextData>,
}

impl crate::resolver::ContextTarget for Device {
    fn target_scope(&self) -> &TargetScope {
        &self.scope
    }

    fn local_context(&self) -> Option<&ContextData> {
        self.local_context_data.as_ref()
    }
}

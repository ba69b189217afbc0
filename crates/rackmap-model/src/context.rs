//! Weighted, conditionally-scoped context documents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::ContextData;
use crate::error::ModelError;
use crate::target::TargetScope;

/// Weight assigned to a context when the caller does not provide one.
pub const DEFAULT_CONTEXT_WEIGHT: i32 = 1000;

/// Upper bound on context weights, matching the storage column range.
pub const MAX_CONTEXT_WEIGHT: i32 = 32_767;

/// Scope assignments restricting which targets a context applies to.
///
/// Every dimension is optional: an empty dimension matches all targets,
/// a populated one matches targets whose corresponding attribute
/// intersects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet {
    /// Matching regions.
    pub regions: BTreeSet<Uuid>,
    /// Matching site groups.
    pub site_groups: BTreeSet<Uuid>,
    /// Matching sites.
    pub sites: BTreeSet<Uuid>,
    /// Matching device types.
    pub device_types: BTreeSet<Uuid>,
    /// Matching device roles.
    pub roles: BTreeSet<Uuid>,
    /// Matching platforms.
    pub platforms: BTreeSet<Uuid>,
    /// Matching cluster types.
    pub cluster_types: BTreeSet<Uuid>,
    /// Matching cluster groups.
    pub cluster_groups: BTreeSet<Uuid>,
    /// Matching clusters.
    pub clusters: BTreeSet<Uuid>,
    /// Matching tenant groups.
    pub tenant_groups: BTreeSet<Uuid>,
    /// Matching tenants.
    pub tenants: BTreeSet<Uuid>,
    /// Matching tags.
    pub tags: BTreeSet<Uuid>,
}

impl ScopeSet {
    /// True when no dimension is populated, i.e. the context matches
    /// every target.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.regions.is_empty()
            && self.site_groups.is_empty()
            && self.sites.is_empty()
            && self.device_types.is_empty()
            && self.roles.is_empty()
            && self.platforms.is_empty()
            && self.cluster_types.is_empty()
            && self.cluster_groups.is_empty()
            && self.clusters.is_empty()
            && self.tenant_groups.is_empty()
            && self.tenants.is_empty()
            && self.tags.is_empty()
    }

    /// Evaluate the scope against a target's attributes.
    #[must_use]
    pub fn matches(&self, target: &TargetScope) -> bool {
        many_dimension(&self.regions, &target.regions)
            && many_dimension(&self.site_groups, &target.site_groups)
            && one_dimension(&self.sites, target.site)
            && one_dimension(&self.device_types, target.device_type)
            && one_dimension(&self.roles, target.role)
            && one_dimension(&self.platforms, target.platform)
            && one_dimension(&self.cluster_types, target.cluster_type)
            && one_dimension(&self.cluster_groups, target.cluster_group)
            && one_dimension(&self.clusters, target.cluster)
            && many_dimension(&self.tenant_groups, &target.tenant_groups)
            && one_dimension(&self.tenants, target.tenant)
            && set_dimension(&self.tags, &target.tags)
    }
}

fn one_dimension(scope: &BTreeSet<Uuid>, value: Option<Uuid>) -> bool {
    scope.is_empty() || value.is_some_and(|id| scope.contains(&id))
}

fn many_dimension(scope: &BTreeSet<Uuid>, values: &[Uuid]) -> bool {
    scope.is_empty() || values.iter().any(|id| scope.contains(id))
}

fn set_dimension(scope: &BTreeSet<Uuid>, values: &BTreeSet<Uuid>) -> bool {
    scope.is_empty() || !scope.is_disjoint(values)
}

/// A named, weighted JSON document contributing configuration data to
/// matching targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigContext {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name; the resolution order tiebreaker.
    pub name: String,
    /// Priority: lower weights apply first, higher weights win conflicts.
    pub weight: i32,
    /// Free-form description.
    pub description: String,
    /// Inactive contexts never participate in resolution.
    pub is_active: bool,
    /// Scope assignments.
    pub scope: ScopeSet,
    /// The contributed document, always an object.
    pub data: ContextData,
}

impl ConfigContext {
    /// Construct a validated context with default flags and empty scope.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when the name is empty or the weight is
    /// out of range.
    pub fn new(name: impl Into<String>, weight: i32, data: ContextData) -> Result<Self, ModelError> {
        let context = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            weight,
            description: String::new(),
            is_active: true,
            scope: ScopeSet::default(),
            data,
        };
        context.validate()?;
        Ok(context)
    }

    /// Re-check invariants that do not hold by construction.
    ///
    /// The document shape is enforced when [`ContextData`] is parsed, so
    /// only the name and weight need checking here.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] identifying the offending field.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::NameEmpty);
        }
        if !(0..=MAX_CONTEXT_WEIGHT).contains(&self.weight) {
            return Err(ModelError::WeightOutOfRange { value: self.weight });
        }
        Ok(())
    }

    /// True when the context is active and its scope matches the target.
    #[must_use]
    pub fn applies_to(&self, target: &TargetScope) -> bool {
        self.is_active && self.scope.matches(target)
    }

    /// Resolution ordering key. `name` is unique, so the order is total.
    #[must_use]
    pub fn resolution_key(&self) -> (i32, &str) {
        (self.weight, self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> ContextData {
        ContextData::try_from(value).expect("object document")
    }

    #[test]
    fn new_applies_validation() {
        assert!(ConfigContext::new("base", DEFAULT_CONTEXT_WEIGHT, data(json!({}))).is_ok());

        let err = ConfigContext::new("", 1000, data(json!({}))).unwrap_err();
        assert_eq!(err, ModelError::NameEmpty);

        let err = ConfigContext::new("heavy", 40_000, data(json!({}))).unwrap_err();
        assert_eq!(err, ModelError::WeightOutOfRange { value: 40_000 });

        let err = ConfigContext::new("negative", -1, data(json!({}))).unwrap_err();
        assert_eq!(err, ModelError::WeightOutOfRange { value: -1 });
    }

    #[test]
    fn unrestricted_scope_matches_any_target() {
        let scope = ScopeSet::default();
        assert!(scope.is_unrestricted());
        assert!(scope.matches(&TargetScope::default()));
    }

    #[test]
    fn populated_dimension_requires_intersection() {
        let site = Uuid::new_v4();
        let mut scope = ScopeSet::default();
        scope.sites.insert(site);

        let mut target = TargetScope::default();
        assert!(!scope.matches(&target));

        target.site = Some(Uuid::new_v4());
        assert!(!scope.matches(&target));

        target.site = Some(site);
        assert!(scope.matches(&target));
    }

    #[test]
    fn all_populated_dimensions_must_match() {
        let site = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let mut scope = ScopeSet::default();
        scope.sites.insert(site);
        scope.tenants.insert(tenant);

        let mut target = TargetScope::default();
        target.site = Some(site);
        assert!(!scope.matches(&target), "tenant dimension unmatched");

        target.tenant = Some(tenant);
        assert!(scope.matches(&target));
    }

    #[test]
    fn tag_dimension_matches_on_any_shared_tag() {
        let shared = Uuid::new_v4();
        let mut scope = ScopeSet::default();
        scope.tags.insert(shared);
        scope.tags.insert(Uuid::new_v4());

        let mut target = TargetScope::default();
        target.tags.insert(Uuid::new_v4());
        assert!(!scope.matches(&target));

        target.tags.insert(shared);
        assert!(scope.matches(&target));
    }

    #[test]
    fn inactive_contexts_never_apply() {
        let mut context = ConfigContext::new("dormant", 1000, data(json!({"a": 1}))).unwrap();
        context.is_active = false;
        assert!(!context.applies_to(&TargetScope::default()));
    }
}

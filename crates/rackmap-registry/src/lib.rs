#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Model feature registry.
//!
//! Models opt into cross-cutting capabilities (tagging, webhooks, export
//! templates, ...) by registering under feature buckets during application
//! bootstrap. The registry is an explicit value constructed at startup and
//! shared immutably afterwards; consumers that need a "which models have
//! feature X" predicate build a [`FeatureQuery`] up front and resolve it
//! against the registry at the point of use, so construction order does
//! not matter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration errors raised while populating the registry.
///
/// These abort startup; they are never surfaced to API callers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A model attempted to register under a feature that does not exist.
    #[error("'{name}' is not a valid model feature")]
    UnknownFeature {
        /// Feature label provided at registration.
        name: String,
    },
}

/// The fixed set of capabilities a model may opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// User-defined fields on model records.
    CustomFields,
    /// User-defined links rendered on detail views.
    CustomLinks,
    /// Rendered export templates for list views.
    ExportTemplates,
    /// Background job result tracking.
    JobResults,
    /// Free-form journal entries attached to records.
    Journaling,
    /// Tag assignment.
    Tags,
    /// Outbound change notifications.
    Webhooks,
}

impl Feature {
    /// Every supported feature.
    pub const ALL: [Self; 7] = [
        Self::CustomFields,
        Self::CustomLinks,
        Self::ExportTemplates,
        Self::JobResults,
        Self::Journaling,
        Self::Tags,
        Self::Webhooks,
    ];

    /// Stable lowercase label used on the wire and in registration calls.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomFields => "custom_fields",
            Self::CustomLinks => "custom_links",
            Self::ExportTemplates => "export_templates",
            Self::JobResults => "job_results",
            Self::Journaling => "journaling",
            Self::Tags => "tags",
            Self::Webhooks => "webhooks",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == value)
            .ok_or_else(|| RegistryError::UnknownFeature {
                name: value.to_string(),
            })
    }
}

/// Identifies a registered model as an (application label, model name)
/// pair, e.g. `dcim.device`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelKey {
    /// Application the model belongs to.
    pub app_label: String,
    /// Lowercase model name.
    pub model: String,
}

impl ModelKey {
    /// Build a key from its two components.
    #[must_use]
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.app_label, self.model)
    }
}

/// Feature name → app label → model names, populated once at startup.
#[derive(Debug, Default, Clone)]
pub struct FeatureRegistry {
    buckets: BTreeMap<Feature, BTreeMap<String, BTreeSet<String>>>,
}

impl FeatureRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `model` under each named feature bucket.
    ///
    /// Every name is validated against the supported set before any
    /// state is mutated, so a bad census entry cannot leave the registry
    /// half-populated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownFeature`] naming the first
    /// unrecognised feature.
    pub fn register(&mut self, model: &ModelKey, features: &[&str]) -> Result<(), RegistryError> {
        let parsed = features
            .iter()
            .map(|name| name.parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()?;

        for feature in parsed {
            self.buckets
                .entry(feature)
                .or_default()
                .entry(model.app_label.clone())
                .or_default()
                .insert(model.model.clone());
        }
        Ok(())
    }

    /// True when `model` registered for `feature`.
    #[must_use]
    pub fn supports(&self, feature: Feature, model: &ModelKey) -> bool {
        self.buckets
            .get(&feature)
            .and_then(|apps| apps.get(&model.app_label))
            .is_some_and(|models| models.contains(&model.model))
    }

    /// All models registered for `feature`, in key order.
    #[must_use]
    pub fn models_for(&self, feature: Feature) -> Vec<ModelKey> {
        self.buckets
            .get(&feature)
            .map(|apps| {
                apps.iter()
                    .flat_map(|(app_label, models)| {
                        models
                            .iter()
                            .map(|model| ModelKey::new(app_label.clone(), model.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Deferred "which models have this feature" lookup.
///
/// The query can be built at any time, including before the registry is
/// populated; the registry contents are read only when [`resolve`] is
/// called.
///
/// [`resolve`]: FeatureQuery::resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureQuery {
    feature: Feature,
}

impl FeatureQuery {
    /// Capture the feature to query for.
    #[must_use]
    pub const fn new(feature: Feature) -> Self {
        Self { feature }
    }

    /// Feature this query targets.
    #[must_use]
    pub const fn feature(self) -> Feature {
        self.feature
    }

    /// Snapshot the registry into a matching predicate.
    #[must_use]
    pub fn resolve(self, registry: &FeatureRegistry) -> ModelPredicate {
        let clauses = registry
            .buckets
            .get(&self.feature)
            .map(|apps| {
                apps.iter()
                    .map(|(app_label, models)| (app_label.clone(), models.clone()))
                    .collect()
            })
            .unwrap_or_default();
        ModelPredicate { clauses }
    }
}

/// Disjunction of (app label, model-name set) clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPredicate {
    clauses: Vec<(String, BTreeSet<String>)>,
}

impl ModelPredicate {
    /// True when `model` satisfies any clause.
    #[must_use]
    pub fn matches(&self, model: &ModelKey) -> bool {
        self.clauses
            .iter()
            .any(|(app_label, models)| *app_label == model.app_label && models.contains(&model.model))
    }

    /// True when no model can match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Implemented by records that may carry a tag collection.
pub trait TagBearer {
    /// The record's tag set, when it has one.
    fn tag_set(&self) -> Option<&BTreeSet<Uuid>>;
}

/// Capability probe: true iff the object exposes a tag collection.
#[must_use]
pub fn is_taggable(object: &dyn TagBearer) -> bool {
    object.tag_set().is_some()
}

impl TagBearer for rackmap_model::Device {
    fn tag_set(&self) -> Option<&BTreeSet<Uuid>> {
        Some(&self.scope.tags)
    }
}

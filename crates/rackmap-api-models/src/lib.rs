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
//! Shared HTTP DTOs for the Rackmap public API.
//!
//! The conversions live close to the wire types so the mapping from
//! domain objects (`ConfigContext`, `Device`, ...) remains a single
//! source of truth.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use rackmap_model::{
    ConfigContext, ContextData, DEFAULT_CONTEXT_WEIGHT, Device, Entity, EntityKind, ModelError,
    ScopeSet, TargetScope,
};
use rackmap_registry::ModelKey;
use rackmap_search::SearchTypeResults;

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parameters that failed validation, if applicable.
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON Pointer to the offending field.
    pub pointer: String,
    /// Human-readable description of the validation failure.
    pub message: String,
}

/// Create/update payload for a config context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigContextRequest {
    /// Unique display name.
    pub name: String,
    /// Priority; defaults to 1000.
    #[serde(default)]
    pub weight: Option<i32>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the context participates in resolution. Defaults to true.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Scope assignments. Absent dimensions match everything.
    #[serde(default)]
    pub scope: Option<ScopeSet>,
    /// The contributed document. Must be a JSON object.
    pub data: Value,
}

impl ConfigContextRequest {
    /// Convert into a validated domain object under the given id.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] identifying the offending field.
    pub fn into_model(self, id: Uuid) -> Result<ConfigContext, ModelError> {
        let data = ContextData::from_value(self.data, "data")?;
        let context = ConfigContext {
            id,
            name: self.name,
            weight: self.weight.unwrap_or(DEFAULT_CONTEXT_WEIGHT),
            description: self.description.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            scope: self.scope.unwrap_or_default(),
            data,
        };
        context.validate()?;
        Ok(context)
    }
}

/// Wire representation of a config context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigContextView {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Priority.
    pub weight: i32,
    /// Free-form description.
    pub description: String,
    /// Whether the context participates in resolution.
    pub is_active: bool,
    /// Scope assignments.
    pub scope: ScopeSet,
    /// The contributed document.
    pub data: Value,
}

impl From<ConfigContext> for ConfigContextView {
    fn from(context: ConfigContext) -> Self {
        Self {
            id: context.id,
            name: context.name,
            weight: context.weight,
            description: context.description,
            is_active: context.is_active,
            scope: context.scope,
            data: context.data.into_value(),
        }
    }
}

/// Create/update payload for a device record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRequest {
    /// Unique display name.
    pub name: String,
    /// Scope attributes used for context matching.
    #[serde(default)]
    pub scope: Option<TargetScope>,
    /// Optional local override document. Must be a JSON object when
    /// present; null clears it.
    #[serde(default)]
    pub local_context_data: Option<Value>,
}

impl DeviceRequest {
    /// Convert into a domain object under the given id.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when `local_context_data` is present but
    /// not an object.
    pub fn into_model(self, id: Uuid) -> Result<Device, ModelError> {
        let local_context_data = match self.local_context_data {
            None | Some(Value::Null) => None,
            Some(value) => Some(ContextData::from_value(value, "local_context_data")?),
        };
        Ok(Device {
            id,
            name: self.name,
            scope: self.scope.unwrap_or_default(),
            local_context_data,
        })
    }
}

/// Wire representation of a device record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceView {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Scope attributes.
    pub scope: TargetScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Local override document, when set.
    pub local_context_data: Option<Value>,
}

impl From<Device> for DeviceView {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            scope: device.scope,
            local_context_data: device.local_context_data.map(ContextData::into_value),
        }
    }
}

/// Rendered configuration context for a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedContextView {
    /// The merged document. Always an object, possibly empty.
    pub context: Value,
}

impl From<ContextData> for RenderedContextView {
    fn from(data: ContextData) -> Self {
        Self {
            context: data.into_value(),
        }
    }
}

/// Create payload for an organisational entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRequest {
    /// Kind label (`site`, `tenant`, ...).
    pub kind: String,
    /// Display name.
    pub name: String,
    /// URL-safe identifier; derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

impl EntityRequest {
    /// Convert into a domain object under the given id.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when the kind label is unknown.
    pub fn into_model(self, id: Uuid) -> Result<Entity, ModelError> {
        let kind = self.kind.parse::<EntityKind>()?;
        let slug = self.slug.unwrap_or_else(|| slugify(&self.name));
        Ok(Entity {
            id,
            kind,
            name: self.name,
            slug,
        })
    }
}

/// Wire representation of an organisational entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    /// Stable identifier.
    pub id: Uuid,
    /// Kind discriminator.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
}

impl From<Entity> for EntityView {
    fn from(entity: Entity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            name: entity.name,
            slug: entity.slug,
        }
    }
}

/// Global search response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Echo of the query string.
    pub query: String,
    /// Per-type result sets, in catalogue order; empty sets are omitted.
    pub results: Vec<SearchTypeResults>,
}

/// Models registered for a feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureModelsView {
    /// Feature label.
    pub feature: String,
    /// Registered models, in key order.
    pub models: Vec<ModelKey>,
}

/// Derive a URL-safe slug from a display name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut previous_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            previous_dash = false;
        } else if !previous_dash {
            slug.push('-');
            previous_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

//! Fixture builders for domain records.

use rackmap_model::{ConfigContext, ContextData, Device, Entity, EntityKind, TargetScope};
use serde_json::Value;
use uuid::Uuid;

/// Build a valid config context from a JSON object literal.
///
/// # Panics
///
/// Panics when `data` is not an object or the name/weight are invalid;
/// fixtures are expected to be well-formed.
#[must_use]
pub fn context_fixture(name: &str, weight: i32, data: Value) -> ConfigContext {
    let data = ContextData::from_value(data, "data").expect("fixture data must be an object");
    ConfigContext::new(name, weight, data).expect("fixture context must validate")
}

/// Build a device with an unrestricted scope and no local override.
#[must_use]
pub fn device_fixture(name: &str) -> Device {
    Device {
        id: Uuid::new_v4(),
        name: name.to_string(),
        scope: TargetScope::default(),
        local_context_data: None,
    }
}

/// Build an organisational entity with a slug derived from the name.
#[must_use]
pub fn entity_fixture(kind: EntityKind, name: &str) -> Entity {
    Entity {
        id: Uuid::new_v4(),
        kind,
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
    }
}

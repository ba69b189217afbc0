//! Object-shaped JSON documents and the recursive merge they fold under.
//!
//! The "must be a JSON object" rule is a parse-time contract: a
//! [`ContextData`] can only be constructed from an object value, so the
//! resolver never has to re-check document shape mid-merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;

/// A JSON document constrained to be an object (mapping).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContextData(Map<String, Value>);

impl ContextData {
    /// An empty document. Merges as a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a raw JSON value, attributing failures to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotAnObject`] when the value is a scalar,
    /// array, or null.
    pub fn from_value(value: Value, field: &'static str) -> Result<Self, ModelError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ModelError::NotAnObject { field }),
        }
    }

    /// Borrow the underlying key/value map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the document, yielding the underlying map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consume the document, yielding a plain JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// True when the document holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Fold `overlay` into this document with [`deep_merge`] semantics.
    pub fn merge_from(&mut self, overlay: &Self) {
        deep_merge(&mut self.0, &overlay.0);
    }
}

impl From<Map<String, Value>> for ContextData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ContextData {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value, "data")
    }
}

impl<'de> Deserialize<'de> for ContextData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Nested objects merge key-by-key; every other value kind (scalars and
/// arrays included) is replaced outright by the overlay's value. The
/// operation is associative in application order but not commutative.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, incoming) in overlay {
        match (base.get_mut(key), incoming) {
            (Some(Value::Object(current)), Value::Object(patch)) => deep_merge(current, patch),
            (Some(slot), _) => *slot = incoming.clone(),
            (None, _) => {
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> ContextData {
        ContextData::try_from(value).expect("object document")
    }

    #[test]
    fn rejects_non_object_documents() {
        let err = ContextData::try_from(json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err, ModelError::NotAnObject { field: "data" });
        assert_eq!(err.field(), "data");

        assert!(ContextData::try_from(json!(42)).is_err());
        assert!(ContextData::try_from(json!("scalar")).is_err());
        assert!(ContextData::try_from(Value::Null).is_err());
    }

    #[test]
    fn from_value_attributes_the_offending_field() {
        let err = ContextData::from_value(json!([1, 2]), "local_context_data").unwrap_err();
        assert_eq!(
            err,
            ModelError::NotAnObject {
                field: "local_context_data"
            }
        );
    }

    #[test]
    fn empty_object_is_valid_and_merges_as_noop() {
        let mut base = document(json!({"a": 1}));
        base.merge_from(&document(json!({})));
        assert_eq!(base, document(json!({"a": 1})));
    }

    #[test]
    fn nested_objects_merge_key_by_key() {
        let mut base = document(json!({"b": {"x": 1}}));
        base.merge_from(&document(json!({"b": {"y": 2}, "c": 3})));
        assert_eq!(base, document(json!({"b": {"x": 1, "y": 2}, "c": 3})));
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let mut base = document(json!({"ntp": ["1.1.1.1"]}));
        base.merge_from(&document(json!({"ntp": ["2.2.2.2"]})));
        assert_eq!(base, document(json!({"ntp": ["2.2.2.2"]})));
    }

    #[test]
    fn scalar_replaces_object_and_vice_versa() {
        let mut base = document(json!({"k": {"nested": true}}));
        base.merge_from(&document(json!({"k": 7})));
        assert_eq!(base, document(json!({"k": 7})));

        let mut base = document(json!({"k": 7}));
        base.merge_from(&document(json!({"k": {"nested": true}})));
        assert_eq!(base, document(json!({"k": {"nested": true}})));
    }

    #[test]
    fn merge_order_is_observable() {
        // [A, B] then C differs from [A, C] then B when B and C collide.
        let a = document(json!({"key": "a"}));
        let b = document(json!({"key": "b"}));
        let c = document(json!({"key": "c"}));

        let mut ab_then_c = a.clone();
        ab_then_c.merge_from(&b);
        ab_then_c.merge_from(&c);

        let mut ac_then_b = a;
        ac_then_b.merge_from(&c);
        ac_then_b.merge_from(&b);

        assert_eq!(ab_then_c.get("key"), Some(&json!("c")));
        assert_eq!(ac_then_b.get("key"), Some(&json!("b")));
        assert_ne!(ab_then_c, ac_then_b);
    }

    #[test]
    fn deserialize_enforces_object_shape() {
        let ok: Result<ContextData, _> = serde_json::from_str(r#"{"dns": ["9.9.9.9"]}"#);
        assert!(ok.is_ok());

        let err: Result<ContextData, _> = serde_json::from_str("[1, 2, 3]");
        assert!(err.is_err());
    }
}

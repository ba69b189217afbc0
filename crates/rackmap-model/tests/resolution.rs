//! End-to-end resolution behaviour through the public API.

use rackmap_model::{
    ConfigContext, ContextData, Device, ScopeSet, TargetScope, render_for_target,
};
use serde_json::json;
use uuid::Uuid;

fn context(name: &str, weight: i32, value: serde_json::Value) -> ConfigContext {
    let data = ContextData::from_value(value, "data").expect("object document");
    ConfigContext::new(name, weight, data).expect("valid context")
}

fn local(value: serde_json::Value) -> ContextData {
    ContextData::from_value(value, "local_context_data").expect("object document")
}

#[test]
fn device_context_layers_by_weight_scope_and_local_override() {
    let site = Uuid::new_v4();
    let tenant = Uuid::new_v4();
    let tag = Uuid::new_v4();

    // Applies everywhere, lowest weight.
    let global = context(
        "global-defaults",
        500,
        json!({"dns": ["10.0.0.53"], "snmp": {"community": "public", "location": "unset"}}),
    );

    // Site-scoped override.
    let mut site_ctx = context(
        "fra1-overrides",
        1000,
        json!({"snmp": {"location": "FRA1"}}),
    );
    site_ctx.scope = ScopeSet {
        sites: [site].into_iter().collect(),
        ..ScopeSet::default()
    };

    // Requires both the tenant and the tag; the device has both.
    let mut tenant_ctx = context(
        "acme-hardening",
        2000,
        json!({"snmp": {"community": "secret"}, "dns": ["10.9.0.53"]}),
    );
    tenant_ctx.scope = ScopeSet {
        tenants: [tenant].into_iter().collect(),
        tags: [tag].into_iter().collect(),
        ..ScopeSet::default()
    };

    // Scoped to a different site; must not contribute.
    let mut other_site = context("ams1-overrides", 3000, json!({"snmp": {"location": "AMS1"}}));
    other_site.scope = ScopeSet {
        sites: [Uuid::new_v4()].into_iter().collect(),
        ..ScopeSet::default()
    };

    let device = Device {
        id: Uuid::new_v4(),
        name: "fra1-edge-01".to_string(),
        scope: TargetScope {
            site: Some(site),
            tenant: Some(tenant),
            tags: [tag].into_iter().collect(),
            ..TargetScope::default()
        },
        local_context_data: Some(local(json!({"dns": ["127.0.0.1"]}))),
    };

    let rendered = render_for_target(&[global, site_ctx, tenant_ctx, other_site], &device);
    assert_eq!(
        rendered.into_value(),
        json!({
            "dns": ["127.0.0.1"],
            "snmp": {"community": "secret", "location": "FRA1"}
        })
    );
}

#[test]
fn rendering_without_matches_yields_the_local_data_alone() {
    let mut scoped = context("scoped", 1000, json!({"a": 1}));
    scoped.scope = ScopeSet {
        sites: [Uuid::new_v4()].into_iter().collect(),
        ..ScopeSet::default()
    };

    let device = Device {
        id: Uuid::new_v4(),
        name: "floating".to_string(),
        scope: TargetScope::default(),
        local_context_data: Some(local(json!({"b": 2}))),
    };

    let rendered = render_for_target(&[scoped], &device);
    assert_eq!(rendered.into_value(), json!({"b": 2}));
}

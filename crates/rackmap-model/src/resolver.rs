//! The weighted context merge and the seams it is fed through.

use async_trait::async_trait;

use crate::context::ConfigContext;
use crate::document::ContextData;
use crate::target::TargetScope;

/// Implemented by records that receive rendered context data.
pub trait ContextTarget {
    /// Scope attributes the target presents for matching.
    fn target_scope(&self) -> &TargetScope;

    /// Local override document, merged last when present.
    fn local_context(&self) -> Option<&ContextData>;
}

/// Async provider of the contexts matching a target's scope.
///
/// Implementations return active contexts only; ordering is not relied
/// upon, since [`rendered_context`] re-sorts before folding.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Fetch the contexts whose scope matches `scope`.
    async fn contexts_for(&self, scope: &TargetScope) -> anyhow::Result<Vec<ConfigContext>>;
}

/// Fold context documents in `(weight, name)` ascending order, then
/// apply the local override last.
///
/// Lower weights apply first, so on key collision the higher weight (or,
/// at equal weight, the lexicographically later name) wins. `name` is
/// unique, making the order total; the fold depends on that. The result
/// is always an object, possibly empty.
#[must_use]
pub fn rendered_context<'a, I>(contexts: I, local: Option<&ContextData>) -> ContextData
where
    I: IntoIterator<Item = &'a ConfigContext>,
{
    let mut ordered: Vec<&ConfigContext> = contexts.into_iter().collect();
    ordered.sort_by(|a, b| a.resolution_key().cmp(&b.resolution_key()));

    let mut merged = ContextData::new();
    for context in ordered {
        merged.merge_from(&context.data);
    }
    if let Some(local) = local {
        merged.merge_from(local);
    }
    merged
}

/// Render a target's context from an in-memory candidate list, applying
/// scope matching before the fold.
#[must_use]
pub fn render_for_target<T>(contexts: &[ConfigContext], target: &T) -> ContextData
where
    T: ContextTarget + ?Sized,
{
    let scope = target.target_scope();
    let matching = contexts.iter().filter(|context| context.applies_to(scope));
    rendered_context(matching, target.local_context())
}

/// Render a target's context by querying a [`ContextSource`].
///
/// # Errors
///
/// Propagates source failures unchanged.
pub async fn resolve_target_context<S, T>(source: &S, target: &T) -> anyhow::Result<ContextData>
where
    S: ContextSource + ?Sized,
    T: ContextTarget + Sync + ?Sized,
{
    let contexts = source.contexts_for(target.target_scope()).await?;
    Ok(rendered_context(contexts.iter(), target.local_context()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScopeSet;
    use crate::target::Device;
    use serde_json::json;
    use uuid::Uuid;

    fn context(name: &str, weight: i32, value: serde_json::Value) -> ConfigContext {
        ConfigContext::new(name, weight, ContextData::try_from(value).unwrap()).unwrap()
    }

    fn local(value: serde_json::Value) -> ContextData {
        ContextData::try_from(value).unwrap()
    }

    #[test]
    fn higher_weight_wins_key_conflicts() {
        let contexts = [
            context("low", 500, json!({"dns": "low", "only_low": true})),
            context("high", 2000, json!({"dns": "high"})),
        ];
        let merged = rendered_context(contexts.iter(), None);
        assert_eq!(merged.get("dns"), Some(&json!("high")));
        assert_eq!(merged.get("only_low"), Some(&json!(true)));
    }

    #[test]
    fn equal_weight_later_name_wins() {
        let contexts = [
            context("alpha", 1000, json!({"who": "alpha"})),
            context("bravo", 1000, json!({"who": "bravo"})),
        ];
        let merged = rendered_context(contexts.iter(), None);
        assert_eq!(merged.get("who"), Some(&json!("bravo")));
    }

    #[test]
    fn input_order_does_not_affect_the_fold() {
        let a = context("alpha", 1000, json!({"who": "alpha"}));
        let b = context("bravo", 1000, json!({"who": "bravo"}));

        let forward = rendered_context([&a, &b], None);
        let reverse = rendered_context([&b, &a], None);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn local_override_always_wins() {
        let contexts = [
            context("base", 1000, json!({"ntp": ["1.1.1.1"]})),
            context("heavy", 32_000, json!({"ntp": ["3.3.3.3"]})),
        ];
        let merged = rendered_context(contexts.iter(), Some(&local(json!({"ntp": ["2.2.2.2"]}))));
        assert_eq!(merged.get("ntp"), Some(&json!(["2.2.2.2"])));
    }

    #[test]
    fn absent_local_data_yields_inherited_only() {
        let contexts = [context("base", 1000, json!({"a": 1}))];
        let merged = rendered_context(contexts.iter(), None);
        assert_eq!(merged.into_value(), json!({"a": 1}));
    }

    #[test]
    fn no_contexts_and_no_local_renders_empty_object() {
        let merged = rendered_context(std::iter::empty(), None);
        assert!(merged.is_empty());
        assert_eq!(merged.into_value(), json!({}));
    }

    #[test]
    fn end_to_end_weighted_merge_with_local_override() {
        let contexts = [
            context("base", 1000, json!({"a": 1, "b": {"x": 1}})),
            context("override", 2000, json!({"b": {"y": 2}, "c": 3})),
        ];
        let merged = rendered_context(contexts.iter(), Some(&local(json!({"a": 9}))));
        assert_eq!(merged.into_value(), json!({"a": 9, "b": {"x": 1, "y": 2}, "c": 3}));
    }

    #[test]
    fn render_for_target_filters_by_scope_and_activity() {
        let site = Uuid::new_v4();

        let mut site_scoped = context("site-dns", 1000, json!({"dns": "site"}));
        site_scoped.scope = ScopeSet {
            sites: [site].into_iter().collect(),
            ..ScopeSet::default()
        };

        let mut elsewhere = context("other-site", 2000, json!({"dns": "other"}));
        elsewhere.scope = ScopeSet {
            sites: [Uuid::new_v4()].into_iter().collect(),
            ..ScopeSet::default()
        };

        let mut disabled = context("disabled", 3000, json!({"dns": "disabled"}));
        disabled.is_active = false;

        let global = context("global", 500, json!({"syslog": "10.0.0.1"}));

        let device = Device {
            id: Uuid::new_v4(),
            name: "edge-router".to_string(),
            scope: TargetScope {
                site: Some(site),
                ..TargetScope::default()
            },
            local_context_data: None,
        };

        let merged = render_for_target(&[site_scoped, elsewhere, disabled, global], &device);
        assert_eq!(merged.get("dns"), Some(&json!("site")));
        assert_eq!(merged.get("syslog"), Some(&json!("10.0.0.1")));
    }

    struct StaticSource(Vec<ConfigContext>);

    #[async_trait]
    impl ContextSource for StaticSource {
        async fn contexts_for(&self, _scope: &TargetScope) -> anyhow::Result<Vec<ConfigContext>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn resolve_target_context_applies_local_last() {
        let source = StaticSource(vec![context("base", 1000, json!({"a": 1}))]);
        let device = Device {
            id: Uuid::new_v4(),
            name: "vm-host".to_string(),
            scope: TargetScope::default(),
            local_context_data: Some(local(json!({"a": 9}))),
        };

        let merged = resolve_target_context(&source, &device).await.unwrap();
        assert_eq!(merged.into_value(), json!({"a": 9}));
    }
}

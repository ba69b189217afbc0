//! Feature registry lookup endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use rackmap_registry::Feature;

use crate::http::errors::ApiError;
use crate::models::FeatureModelsView;
use crate::state::ApiState;

pub(crate) async fn feature_models(
    State(state): State<Arc<ApiState>>,
    Path(feature): Path<String>,
) -> Result<Json<FeatureModelsView>, ApiError> {
    let feature = feature
        .parse::<Feature>()
        .map_err(|err| ApiError::not_found(err.to_string()))?;

    let models = state.registry.models_for(feature);
    Ok(Json(FeatureModelsView {
        feature: feature.to_string(),
        models,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::testing::MemoryInventory;
    use crate::state::{context_model, device_model};
    use rackmap_events::EventBus;
    use rackmap_registry::FeatureRegistry;
    use rackmap_search::SearchCatalog;
    use rackmap_telemetry::Metrics;

    fn sample_state() -> Arc<ApiState> {
        let mut registry = FeatureRegistry::new();
        registry
            .register(&context_model(), &["webhooks", "export_templates"])
            .unwrap();
        registry
            .register(&device_model(), &["webhooks", "tags"])
            .unwrap();

        Arc::new(ApiState::new(
            Arc::new(MemoryInventory::default()),
            Arc::new(registry),
            Arc::new(SearchCatalog::builtin()),
            EventBus::with_capacity(16),
            Metrics::new().expect("metrics"),
        ))
    }

    #[tokio::test]
    async fn lists_models_registered_for_a_feature() {
        let state = sample_state();
        let Json(view) = feature_models(State(state), Path("webhooks".to_string()))
            .await
            .expect("feature lookup");
        assert_eq!(view.feature, "webhooks");
        assert_eq!(view.models.len(), 2);
        assert_eq!(view.models[0].app_label, "dcim");
        assert_eq!(view.models[1].app_label, "extras");
    }

    #[tokio::test]
    async fn unknown_feature_is_not_found() {
        let state = sample_state();
        let err = feature_models(State(state), Path("time_travel".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}

//! Config context endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rackmap_events::ChangeAction;
use uuid::Uuid;

use crate::http::errors::{ApiError, map_data_error, map_validation_error};
use crate::models::{ConfigContextRequest, ConfigContextView};
use crate::state::{ApiState, context_model};

pub(crate) async fn list_contexts(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ConfigContextView>>, ApiError> {
    let contexts = state
        .inventory
        .list_contexts()
        .await
        .map_err(|err| map_data_error(&err, "failed to list config contexts"))?;
    Ok(Json(
        contexts.into_iter().map(ConfigContextView::from).collect(),
    ))
}

pub(crate) async fn create_context(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ConfigContextRequest>,
) -> Result<(StatusCode, Json<ConfigContextView>), ApiError> {
    let context = request
        .into_model(Uuid::new_v4())
        .map_err(|err| map_validation_error(&err))?;

    state
        .inventory
        .create_context(context.clone())
        .await
        .map_err(|err| map_data_error(&err, "failed to create config context"))?;

    state.publish_change(
        ChangeAction::Created,
        &context_model(),
        context.id,
        &context.name,
    );
    Ok((StatusCode::CREATED, Json(context.into())))
}

pub(crate) async fn get_context(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfigContextView>, ApiError> {
    let context = state
        .inventory
        .get_context(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load config context"))?
        .ok_or_else(|| ApiError::not_found(format!("no config context with id {id}")))?;
    Ok(Json(context.into()))
}

pub(crate) async fn update_context(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfigContextRequest>,
) -> Result<Json<ConfigContextView>, ApiError> {
    let context = request
        .into_model(id)
        .map_err(|err| map_validation_error(&err))?;

    let updated = state
        .inventory
        .update_context(context.clone())
        .await
        .map_err(|err| map_data_error(&err, "failed to update config context"))?;
    if !updated {
        return Err(ApiError::not_found(format!(
            "no config context with id {id}"
        )));
    }

    state.publish_change(
        ChangeAction::Updated,
        &context_model(),
        context.id,
        &context.name,
    );
    Ok(Json(context.into()))
}

pub(crate) async fn delete_context(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .inventory
        .delete_context(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to delete config context"))?
        .ok_or_else(|| ApiError::not_found(format!("no config context with id {id}")))?;

    state.publish_change(
        ChangeAction::Deleted,
        &context_model(),
        deleted.id,
        &deleted.name,
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::testing::MemoryInventory;
    use crate::state::device_model;
    use rackmap_events::EventBus;
    use rackmap_registry::FeatureRegistry;
    use rackmap_search::SearchCatalog;
    use rackmap_telemetry::Metrics;
    use serde_json::json;

    fn sample_state() -> (Arc<ApiState>, EventBus) {
        let mut registry = FeatureRegistry::new();
        registry.register(&context_model(), &["webhooks"]).unwrap();
        registry.register(&device_model(), &["webhooks"]).unwrap();

        let events = EventBus::with_capacity(32);
        let state = Arc::new(ApiState::new(
            Arc::new(MemoryInventory::default()),
            Arc::new(registry),
            Arc::new(SearchCatalog::builtin()),
            events.clone(),
            Metrics::new().expect("metrics"),
        ));
        (state, events)
    }

    fn sample_request(name: &str, data: serde_json::Value) -> ConfigContextRequest {
        ConfigContextRequest {
            name: name.to_string(),
            weight: None,
            description: None,
            is_active: None,
            scope: None,
            data,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let (state, events) = sample_state();

        let (status, Json(view)) = create_context(
            State(state.clone()),
            Json(sample_request("base", json!({"a": 1}))),
        )
        .await
        .expect("create");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.weight, 1000);

        let Json(fetched) = get_context(State(state.clone()), Path(view.id))
            .await
            .expect("get");
        assert_eq!(fetched.data, json!({"a": 1}));

        // Creation emitted a change-log event.
        assert!(events.last_event_id().is_some());
    }

    #[tokio::test]
    async fn create_rejects_non_object_data() {
        let (state, _events) = sample_state();
        let err = create_context(
            State(state),
            Json(sample_request("bad", json!(["not", "an", "object"]))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        let params = err.invalid_params.expect("invalid params");
        assert_eq!(params[0].pointer, "/data");
    }

    #[tokio::test]
    async fn update_of_missing_context_is_not_found() {
        let (state, _events) = sample_state();
        let err = update_context(
            State(state),
            Path(Uuid::new_v4()),
            Json(sample_request("ghost", json!({}))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_and_emits() {
        let (state, events) = sample_state();
        let (_, Json(view)) = create_context(
            State(state.clone()),
            Json(sample_request("short-lived", json!({}))),
        )
        .await
        .expect("create");

        let before = events.last_event_id();
        let status = delete_context(State(state.clone()), Path(view.id))
            .await
            .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(events.last_event_id() > before);

        let err = get_context(State(state), Path(view.id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_orders_by_weight_then_name() {
        let (state, _events) = sample_state();
        for (name, weight) in [("zulu", 500), ("alpha", 2000), ("bravo", 500)] {
            let mut request = sample_request(name, json!({}));
            request.weight = Some(weight);
            create_context(State(state.clone()), Json(request))
                .await
                .expect("create");
        }

        let Json(views) = list_contexts(State(state)).await.expect("list");
        let names: Vec<&str> = views.iter().map(|view| view.name.as_str()).collect();
        assert_eq!(names, vec!["bravo", "zulu", "alpha"]);
    }
}

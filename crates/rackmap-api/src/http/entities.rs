//! Organisational entity endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rackmap_events::ChangeAction;
use rackmap_model::EntityKind;
use serde::Deserialize;
use uuid::Uuid;

use crate::http::errors::{ApiError, map_data_error, map_validation_error};
use crate::models::{EntityRequest, EntityView};
use crate::state::{ApiState, entity_model};

#[derive(Debug, Deserialize)]
pub(crate) struct EntityListParams {
    kind: String,
}

pub(crate) async fn list_entities(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<EntityListParams>,
) -> Result<Json<Vec<EntityView>>, ApiError> {
    let kind = params
        .kind
        .parse::<EntityKind>()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let entities = state
        .inventory
        .list_entities(kind)
        .await
        .map_err(|err| map_data_error(&err, "failed to list entities"))?;
    Ok(Json(entities.into_iter().map(EntityView::from).collect()))
}

pub(crate) async fn create_entity(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<EntityRequest>,
) -> Result<(StatusCode, Json<EntityView>), ApiError> {
    let entity = request
        .into_model(Uuid::new_v4())
        .map_err(|err| map_validation_error(&err))?;

    state
        .inventory
        .create_entity(entity.clone())
        .await
        .map_err(|err| map_data_error(&err, "failed to create entity"))?;

    state.publish_change(
        ChangeAction::Created,
        &entity_model(entity.kind),
        entity.id,
        &entity.name,
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

pub(crate) async fn get_entity(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntityView>, ApiError> {
    let entity = state
        .inventory
        .get_entity(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load entity"))?
        .ok_or_else(|| ApiError::not_found(format!("no entity with id {id}")))?;
    Ok(Json(entity.into()))
}

pub(crate) async fn delete_entity(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let entity = state
        .inventory
        .get_entity(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load entity"))?
        .ok_or_else(|| ApiError::not_found(format!("no entity with id {id}")))?;

    state
        .inventory
        .delete_entity(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to delete entity"))?;

    state.publish_change(
        ChangeAction::Deleted,
        &entity_model(entity.kind),
        entity.id,
        &entity.name,
    );
    Ok(StatusCode::NO_CONTENT)
}

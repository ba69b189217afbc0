//! Device endpoints, including the rendered-context view.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rackmap_events::ChangeAction;
use uuid::Uuid;

use crate::http::errors::{ApiError, map_data_error, map_validation_error};
use crate::models::{DeviceRequest, DeviceView, RenderedContextView};
use crate::state::{ApiState, device_model};

pub(crate) async fn list_devices(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let devices = state
        .inventory
        .list_devices()
        .await
        .map_err(|err| map_data_error(&err, "failed to list devices"))?;
    Ok(Json(devices.into_iter().map(DeviceView::from).collect()))
}

pub(crate) async fn create_device(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<DeviceRequest>,
) -> Result<(StatusCode, Json<DeviceView>), ApiError> {
    let device = request
        .into_model(Uuid::new_v4())
        .map_err(|err| map_validation_error(&err))?;

    state
        .inventory
        .upsert_device(device.clone())
        .await
        .map_err(|err| map_data_error(&err, "failed to create device"))?;

    state.publish_change(ChangeAction::Created, &device_model(), device.id, &device.name);
    Ok((StatusCode::CREATED, Json(device.into())))
}

pub(crate) async fn get_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeviceView>, ApiError> {
    let device = state
        .inventory
        .get_device(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load device"))?
        .ok_or_else(|| ApiError::not_found(format!("no device with id {id}")))?;
    Ok(Json(device.into()))
}

pub(crate) async fn update_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeviceRequest>,
) -> Result<Json<DeviceView>, ApiError> {
    state
        .inventory
        .get_device(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load device"))?
        .ok_or_else(|| ApiError::not_found(format!("no device with id {id}")))?;

    let device = request
        .into_model(id)
        .map_err(|err| map_validation_error(&err))?;

    state
        .inventory
        .upsert_device(device.clone())
        .await
        .map_err(|err| map_data_error(&err, "failed to update device"))?;

    state.publish_change(ChangeAction::Updated, &device_model(), device.id, &device.name);
    Ok(Json(device.into()))
}

pub(crate) async fn delete_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .inventory
        .delete_device(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to delete device"))?
        .ok_or_else(|| ApiError::not_found(format!("no device with id {id}")))?;

    state.publish_change(
        ChangeAction::Deleted,
        &device_model(),
        deleted.id,
        &deleted.name,
    );
    Ok(StatusCode::NO_CONTENT)
}

/// The merged configuration context for a device: inherited contexts
/// folded by `(weight, name)`, local override applied last.
pub(crate) async fn get_rendered_context(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderedContextView>, ApiError> {
    let device = state
        .inventory
        .get_device(id)
        .await
        .map_err(|err| map_data_error(&err, "failed to load device"))?
        .ok_or_else(|| ApiError::not_found(format!("no device with id {id}")))?;

    let contexts = state
        .inventory
        .contexts_for_target(&device.scope)
        .await
        .map_err(|err| map_data_error(&err, "failed to gather matching contexts"))?;

    let rendered =
        rackmap_model::rendered_context(contexts.iter(), device.local_context_data.as_ref());
    state.telemetry.inc_context_rendered("device");
    Ok(Json(rendered.into()))
}

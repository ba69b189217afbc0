//! Router construction and server host for the API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use rackmap_events::EventBus;
use rackmap_registry::FeatureRegistry;
use rackmap_search::SearchCatalog;
use rackmap_telemetry::Metrics;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::facade::InventoryFacade;
use crate::http::contexts::{
    create_context, delete_context, get_context, list_contexts, update_context,
};
use crate::http::devices::{
    create_device, delete_device, get_device, get_rendered_context, list_devices, update_device,
};
use crate::http::entities::{create_entity, delete_entity, get_entity, list_entities};
use crate::http::features::feature_models;
use crate::http::health::{health, metrics};
use crate::http::search::global_search;
use crate::http::telemetry::track_requests;
use crate::state::ApiState;

/// Axum router wrapper that hosts the Rackmap API services.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server with shared dependencies wired through
    /// application state.
    #[must_use]
    pub fn new(
        inventory: Arc<dyn InventoryFacade>,
        registry: Arc<FeatureRegistry>,
        catalog: Arc<SearchCatalog>,
        events: EventBus,
        telemetry: Metrics,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            inventory, registry, catalog, events, telemetry,
        ));

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE]);

        let router = Router::new()
            .route("/healthz", get(health))
            .route("/metrics", get(metrics))
            .route(
                "/api/extras/config-contexts",
                get(list_contexts).post(create_context),
            )
            .route(
                "/api/extras/config-contexts/{id}",
                get(get_context).put(update_context).delete(delete_context),
            )
            .route("/api/dcim/devices", get(list_devices).post(create_device))
            .route(
                "/api/dcim/devices/{id}",
                get(get_device).put(update_device).delete(delete_device),
            )
            .route(
                "/api/dcim/devices/{id}/rendered-context",
                get(get_rendered_context),
            )
            .route("/api/entities", get(list_entities).post(create_entity))
            .route("/api/entities/{id}", get(get_entity).delete(delete_entity))
            .route("/api/extras/features/{feature}", get(feature_models))
            .route("/api/search", get(global_search))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                track_requests,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer)
            .with_state(state);

        Self { router }
    }

    /// Clone the underlying router, for embedding or tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve the API on the provided listener until the task is aborted.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener fails.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router)
            .await
            .context("API server terminated unexpectedly")
    }
}

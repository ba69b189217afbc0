//! Global search endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use rackmap_search::{SEARCH_MAX_RESULTS, SearchTypeResults};
use serde::Deserialize;

use crate::http::errors::{ApiError, map_data_error};
use crate::models::SearchResponse;
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    q: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

/// Fan a query out over the catalogue in insertion order; each type
/// contributes at most [`SEARCH_MAX_RESULTS`] hits, and types without a
/// backing repository are skipped.
pub(crate) async fn global_search(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("search query must not be empty"));
    }
    if let Some(type_name) = &params.type_name
        && !state.catalog.contains(type_name)
    {
        return Err(ApiError::bad_request(format!(
            "unknown search type '{type_name}'"
        )));
    }

    let mut results = Vec::new();
    for entry in state.catalog.iter() {
        if let Some(type_name) = &params.type_name
            && entry.name != type_name.as_str()
        {
            continue;
        }

        let Some(hits) = state
            .inventory
            .search(entry.name, query, SEARCH_MAX_RESULTS)
            .await
            .map_err(|err| map_data_error(&err, "search query failed"))?
        else {
            continue;
        };
        if hits.is_empty() {
            continue;
        }

        results.push(SearchTypeResults {
            name: entry.name,
            label: entry.label,
            section: entry.section.label(),
            list_url: entry.list_url,
            hits,
        });
    }

    state
        .telemetry
        .inc_search_query(if results.is_empty() { "miss" } else { "hit" });
    Ok(Json(SearchResponse {
        query: query.to_string(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::InventoryFacade;
    use crate::facade::testing::MemoryInventory;
    use crate::state::{context_model, device_model};
    use rackmap_events::EventBus;
    use rackmap_model::EntityKind;
    use rackmap_registry::FeatureRegistry;
    use rackmap_search::SearchCatalog;
    use rackmap_telemetry::Metrics;
    use rackmap_test_support::{context_fixture, device_fixture, entity_fixture};
    use serde_json::json;

    async fn seeded_state() -> Arc<ApiState> {
        let inventory = MemoryInventory::default();

        inventory
            .create_entity(entity_fixture(EntityKind::Site, "Frankfurt edge"))
            .await
            .unwrap();
        inventory
            .upsert_device(device_fixture("edge-router-1"))
            .await
            .unwrap();
        inventory
            .create_context(context_fixture("edge-dns", 1000, json!({})))
            .await
            .unwrap();

        let mut registry = FeatureRegistry::new();
        registry.register(&context_model(), &["webhooks"]).unwrap();
        registry.register(&device_model(), &["webhooks"]).unwrap();

        Arc::new(ApiState::new(
            Arc::new(inventory),
            Arc::new(registry),
            Arc::new(SearchCatalog::builtin()),
            EventBus::with_capacity(16),
            Metrics::new().expect("metrics"),
        ))
    }

    #[tokio::test]
    async fn search_fans_out_over_the_catalogue() {
        let state = seeded_state().await;
        let Json(response) = global_search(
            State(state),
            Query(SearchParams {
                q: "edge".to_string(),
                type_name: None,
            }),
        )
        .await
        .expect("search");

        let names: Vec<&str> = response.results.iter().map(|result| result.name).collect();
        // Catalogue order: DCIM types first, extras last.
        assert_eq!(names, vec!["site", "device", "configcontext"]);
        assert_eq!(response.query, "edge");
    }

    #[tokio::test]
    async fn type_filter_restricts_the_fan_out() {
        let state = seeded_state().await;
        let Json(response) = global_search(
            State(state),
            Query(SearchParams {
                q: "edge".to_string(),
                type_name: Some("device".to_string()),
            }),
        )
        .await
        .expect("search");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].name, "device");
        assert_eq!(response.results[0].hits[0].title, "edge-router-1");
    }

    #[tokio::test]
    async fn unknown_type_filter_is_rejected() {
        let state = seeded_state().await;
        let err = global_search(
            State(state),
            Query(SearchParams {
                q: "edge".to_string(),
                type_name: Some("widget".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let state = seeded_state().await;
        let err = global_search(
            State(state),
            Query(SearchParams {
                q: "   ".to_string(),
                type_name: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}

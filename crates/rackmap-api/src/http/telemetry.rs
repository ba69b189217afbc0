//! Per-request metrics middleware.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::ApiState;

/// Record every response against the matched route template.
pub(crate) async fn track_requests(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |path| path.as_str().to_string(),
    );
    let response = next.run(request).await;
    state
        .telemetry
        .inc_http_request(&route, response.status().as_u16());
    response
}

//! `GET /`: lists the routes this service answers.

use axum::Json;
use friendgraph_api::EndpointIndex;

pub const ENDPOINTS: &[&str] = &[
    "GET /friends/{user}",
    "GET /friends/{user}/pending",
    "GET /friends/{user}/pending_request",
    "GET /friends/{user}/status/{friend}",
    "POST /friends/{user}/add",
    "DELETE /friends/{user}/cancel",
    "POST /friends/{user}/accept",
    "DELETE /friends/{user}/decline",
    "DELETE /friends/{user}/delete",
    "POST /friends/insert",
    "DELETE /friends/delete",
];

pub async fn index() -> Json<EndpointIndex> {
    Json(EndpointIndex {
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

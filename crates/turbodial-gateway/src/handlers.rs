// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the CRM-facing REST API.
//!
//! `POST /v1/queue` is the only inbound surface the rest of the CRM uses;
//! the rep login/logout routes are called by the soft-phone frontend when
//! a rep joins or leaves the dialing pool.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use turbodial_core::{LeadRef, TurbodialError};
use turbodial_storage::queries::{queue, reps};

use crate::server::GatewayState;

/// Request body for POST /v1/queue.
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub org_id: String,
    /// Leads to dial; already-queued leads are refreshed, not duplicated.
    pub leads: Vec<LeadRef>,
    /// Higher priority dials sooner.
    #[serde(default)]
    pub priority: i64,
    /// Operator who queued the leads.
    #[serde(default)]
    pub added_by: Option<String>,
}

/// Response body for POST /v1/queue.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub enqueued: usize,
}

/// Query parameters for GET /v1/queue/status.
#[derive(Debug, Deserialize)]
pub struct QueueStatusParams {
    pub org_id: String,
}

/// One per-status count in the queue status report.
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Response body for GET /v1/queue/status.
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub org_id: String,
    pub counts: Vec<StatusCount>,
    pub available_reps: i64,
}

/// Request body for POST /v1/reps/login.
#[derive(Debug, Deserialize)]
pub struct RepLoginRequest {
    pub session_id: String,
    pub rep_id: String,
    pub org_id: String,
}

/// Request body for POST /v1/reps/logout.
#[derive(Debug, Deserialize)]
pub struct RepLogoutRequest {
    pub session_id: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(err: TurbodialError) -> Response {
    tracing::error!(error = %err, "API request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// GET /health — unauthenticated liveness probe.
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /v1/queue — idempotently enqueue leads for dialing.
pub async fn post_queue(
    State(state): State<GatewayState>,
    Json(request): Json<EnqueueRequest>,
) -> Response {
    if request.leads.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "leads must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    match queue::enqueue(
        state.engine.db(),
        &request.org_id,
        &request.leads,
        request.priority,
        request.added_by.as_deref(),
    )
    .await
    {
        Ok(enqueued) => {
            tracing::info!(org_id = %request.org_id, enqueued, "leads enqueued");
            (StatusCode::OK, Json(EnqueueResponse { enqueued })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /v1/queue/status — per-status counts plus the available rep pool.
pub async fn get_queue_status(
    State(state): State<GatewayState>,
    Query(params): Query<QueueStatusParams>,
) -> Response {
    let counts = match queue::status_counts(state.engine.db(), &params.org_id).await {
        Ok(counts) => counts,
        Err(e) => return internal_error(e),
    };
    let available = match reps::available_count(state.engine.db(), &params.org_id).await {
        Ok(n) => n,
        Err(e) => return internal_error(e),
    };

    Json(QueueStatusResponse {
        org_id: params.org_id,
        counts: counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        available_reps: available,
    })
    .into_response()
}

/// POST /v1/reps/login — a rep joins the dialing pool.
pub async fn post_rep_login(
    State(state): State<GatewayState>,
    Json(request): Json<RepLoginRequest>,
) -> Response {
    match reps::open_session(
        state.engine.db(),
        &request.session_id,
        &request.rep_id,
        &request.org_id,
    )
    .await
    {
        Ok(()) => {
            tracing::info!(
                session_id = %request.session_id,
                rep_id = %request.rep_id,
                "rep joined the pool"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// POST /v1/reps/logout — a rep leaves the dialing pool.
pub async fn post_rep_logout(
    State(state): State<GatewayState>,
    Json(request): Json<RepLogoutRequest>,
) -> Response {
    match reps::close_session(state.engine.db(), &request.session_id).await {
        Ok(()) => {
            tracing::info!(session_id = %request.session_id, "rep left the pool");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_request_deserializes_with_defaults() {
        let json = r#"{
            "org_id": "org-1",
            "leads": [{"lead_id": "lead-1", "phone": "+15551230000"}]
        }"#;
        let req: EnqueueRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.org_id, "org-1");
        assert_eq!(req.leads.len(), 1);
        assert_eq!(req.leads[0].phone, "+15551230000");
        assert_eq!(req.priority, 0);
        assert!(req.added_by.is_none());
    }

    #[test]
    fn queue_status_response_serializes() {
        let resp = QueueStatusResponse {
            org_id: "org-1".to_string(),
            counts: vec![StatusCount {
                status: "queued".to_string(),
                count: 4,
            }],
            available_reps: 2,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"queued\""));
        assert!(json.contains("\"available_reps\":2"));
    }
}

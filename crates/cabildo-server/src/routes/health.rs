// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
	pub status: String,
	pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Liveness check including a database ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let (status, label) = match sqlx::query("SELECT 1").execute(&state.pool).await {
		Ok(_) => (StatusCode::OK, "ok"),
		Err(e) => {
			tracing::error!(error = %e, "health check database ping failed");
			(StatusCode::SERVICE_UNAVAILABLE, "degraded")
		}
	};

	(
		status,
		Json(HealthResponse {
			status: label.to_string(),
			timestamp: chrono::Utc::now().to_rfc3339(),
		}),
	)
}

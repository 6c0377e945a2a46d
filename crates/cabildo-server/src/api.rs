// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cabildo_server_analytics::{AnalyticsState, SqliteAnalyticsRepository};

use crate::config::{ServerConfig, StatsAuthConfig};
use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub analytics_state: Arc<AnalyticsState<SqliteAnalyticsRepository>>,
	pub stats_auth: StatsAuthConfig,
	pub pool: SqlitePool,
}

/// Creates the application state.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	let repository = SqliteAnalyticsRepository::new(pool.clone());
	AppState {
		analytics_state: Arc::new(AnalyticsState::new(repository)),
		stats_auth: config.stats_auth.clone(),
		pool,
	}
}

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health_check,
		routes::analytics::start_session,
		routes::analytics::end_session,
		routes::analytics::create_pageview,
		routes::analytics::create_event,
		routes::analytics::batch_pageviews,
		routes::analytics::batch_events,
		routes::analytics::stats_summary,
		routes::analytics::list_sessions,
		routes::analytics::daily_pageviews,
		routes::analytics::top_pages,
		routes::analytics::report_pdf,
	),
	tags(
		(name = "health", description = "Service health"),
		(name = "analitica", description = "Web analytics ingestion and reporting")
	)
)]
struct ApiDoc;

/// Creates the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
	let analitica = Router::new()
		.route("/sessions/start", post(routes::analytics::start_session))
		.route("/sessions/end", post(routes::analytics::end_session))
		.route("/pageviews", post(routes::analytics::create_pageview))
		.route("/pageviews/batch", post(routes::analytics::batch_pageviews))
		.route("/events", post(routes::analytics::create_event))
		.route("/events/batch", post(routes::analytics::batch_events))
		.route("/stats/summary", get(routes::analytics::stats_summary))
		.route("/stats/sessions", get(routes::analytics::list_sessions))
		.route(
			"/stats/pageviews/daily",
			get(routes::analytics::daily_pageviews),
		)
		.route("/stats/pages/top", get(routes::analytics::top_pages))
		.route("/stats/report/pdf", get(routes::analytics::report_pdf));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.nest("/api/v1/analitica", analitica)
		.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
		.with_state(state)
}

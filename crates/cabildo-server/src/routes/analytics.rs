// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Web-analytics HTTP handlers.
//!
//! Ingestion endpoints are public (the tracking script calls them without
//! credentials); reporting endpoints require a role with stats access.

use axum::{
	extract::{Query, State},
	response::IntoResponse,
	Json,
};

use cabildo_server_analytics::{
	batch_events_impl, batch_pageviews_impl, create_event_impl, create_pageview_impl,
	daily_pageviews_impl, end_session_impl, list_sessions_impl, report_pdf_impl,
	start_session_impl, stats_summary_impl, top_pages_impl,
};
use cabildo_server_api::{
	AnalyticsErrorResponse, BatchCreatedResponse, DailyPageviewsQuery, DailyPageviewsRow,
	EventBatchRequest, EventItemRequest, PageViewBatchRequest, PageViewItemRequest,
	ReportPdfQuery, SessionEndRequest, SessionEndResponse, SessionListQuery, SessionListRow,
	SessionStartRequest, SessionStartResponse, StatsSummaryQuery, StatsSummaryResponse,
	TopPagesQuery, TopPagesRow,
};

use crate::{api::AppState, auth_middleware::RequireStats};

/// Start (or resume) a browsing session.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/sessions/start",
    request_body = SessionStartRequest,
    responses(
        (status = 201, description = "Session started or already known", body = SessionStartResponse),
        (status = 400, description = "Invalid request", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(sesion_id = %payload.sesion_id))]
pub async fn start_session(
	State(state): State<AppState>,
	Json(payload): Json<SessionStartRequest>,
) -> impl IntoResponse {
	start_session_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Terminate a browsing session, fixing its duration and bounce flag.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/sessions/end",
    request_body = SessionEndRequest,
    responses(
        (status = 200, description = "Session closed (idempotent)", body = SessionEndResponse),
        (status = 400, description = "Invalid request", body = AnalyticsErrorResponse),
        (status = 404, description = "No such session for this visitor", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(sesion_id = %payload.sesion_id))]
pub async fn end_session(
	State(state): State<AppState>,
	Json(payload): Json<SessionEndRequest>,
) -> impl IntoResponse {
	end_session_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Ingest a single page view.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/pageviews",
    request_body = PageViewItemRequest,
    responses(
        (status = 201, description = "Page view ingested", body = BatchCreatedResponse),
        (status = 400, description = "Invalid page view", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(ruta = %payload.ruta))]
pub async fn create_pageview(
	State(state): State<AppState>,
	Json(payload): Json<PageViewItemRequest>,
) -> impl IntoResponse {
	create_pageview_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Ingest a single event.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/events",
    request_body = EventItemRequest,
    responses(
        (status = 201, description = "Event ingested", body = BatchCreatedResponse),
        (status = 400, description = "Invalid event", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(tipo = %payload.tipo, nombre = %payload.nombre))]
pub async fn create_event(
	State(state): State<AppState>,
	Json(payload): Json<EventItemRequest>,
) -> impl IntoResponse {
	create_event_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Ingest a batch of page views.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/pageviews/batch",
    request_body = PageViewBatchRequest,
    responses(
        (status = 201, description = "Batch ingested", body = BatchCreatedResponse),
        (status = 400, description = "Invalid batch", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(items = payload.items.len()))]
pub async fn batch_pageviews(
	State(state): State<AppState>,
	Json(payload): Json<PageViewBatchRequest>,
) -> impl IntoResponse {
	batch_pageviews_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Ingest a batch of events.
#[utoipa::path(
    post,
    path = "/api/v1/analitica/events/batch",
    request_body = EventBatchRequest,
    responses(
        (status = 201, description = "Batch ingested", body = BatchCreatedResponse),
        (status = 400, description = "Invalid batch", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica"
)]
#[tracing::instrument(skip(state, payload), fields(items = payload.items.len()))]
pub async fn batch_events(
	State(state): State<AppState>,
	Json(payload): Json<EventBatchRequest>,
) -> impl IntoResponse {
	batch_events_impl(state.analytics_state.clone(), payload)
		.await
		.into_response()
}

/// Aggregate traffic summary.
#[utoipa::path(
    get,
    path = "/api/v1/analitica/stats/summary",
    params(StatsSummaryQuery),
    responses(
        (status = 200, description = "Aggregate summary", body = StatsSummaryResponse),
        (status = 400, description = "Invalid query", body = AnalyticsErrorResponse),
        (status = 401, description = "Not authenticated", body = AnalyticsErrorResponse),
        (status = 403, description = "Insufficient role", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica",
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth))]
pub async fn stats_summary(
	RequireStats(_auth): RequireStats,
	State(state): State<AppState>,
	Query(query): Query<StatsSummaryQuery>,
) -> impl IntoResponse {
	stats_summary_impl(state.analytics_state.clone(), query)
		.await
		.into_response()
}

/// Daily pageview counts, chronologically ascending.
#[utoipa::path(
    get,
    path = "/api/v1/analitica/stats/pageviews/daily",
    params(DailyPageviewsQuery),
    responses(
        (status = 200, description = "Daily buckets", body = [DailyPageviewsRow]),
        (status = 400, description = "Invalid query", body = AnalyticsErrorResponse),
        (status = 401, description = "Not authenticated", body = AnalyticsErrorResponse),
        (status = 403, description = "Insufficient role", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica",
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth), fields(days = query.days))]
pub async fn daily_pageviews(
	RequireStats(_auth): RequireStats,
	State(state): State<AppState>,
	Query(query): Query<DailyPageviewsQuery>,
) -> impl IntoResponse {
	daily_pageviews_impl(state.analytics_state.clone(), query)
		.await
		.into_response()
}

/// List sessions, most recent first, with optional filters.
#[utoipa::path(
    get,
    path = "/api/v1/analitica/stats/sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Sessions", body = [SessionListRow]),
        (status = 400, description = "Invalid query", body = AnalyticsErrorResponse),
        (status = 401, description = "Not authenticated", body = AnalyticsErrorResponse),
        (status = 403, description = "Insufficient role", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica",
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth), fields(limit = query.limit))]
pub async fn list_sessions(
	RequireStats(_auth): RequireStats,
	State(state): State<AppState>,
	Query(query): Query<SessionListQuery>,
) -> impl IntoResponse {
	list_sessions_impl(state.analytics_state.clone(), query)
		.await
		.into_response()
}

/// Most-visited pages by view count.
#[utoipa::path(
    get,
    path = "/api/v1/analitica/stats/pages/top",
    params(TopPagesQuery),
    responses(
        (status = 200, description = "Top pages", body = [TopPagesRow]),
        (status = 400, description = "Invalid query", body = AnalyticsErrorResponse),
        (status = 401, description = "Not authenticated", body = AnalyticsErrorResponse),
        (status = 403, description = "Insufficient role", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica",
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth), fields(limit = query.limit))]
pub async fn top_pages(
	RequireStats(_auth): RequireStats,
	State(state): State<AppState>,
	Query(query): Query<TopPagesQuery>,
) -> impl IntoResponse {
	top_pages_impl(state.analytics_state.clone(), query)
		.await
		.into_response()
}

/// Downloadable PDF report of the aggregate stats.
#[utoipa::path(
    get,
    path = "/api/v1/analitica/stats/report/pdf",
    params(ReportPdfQuery),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf"),
        (status = 400, description = "Invalid query", body = AnalyticsErrorResponse),
        (status = 401, description = "Not authenticated", body = AnalyticsErrorResponse),
        (status = 403, description = "Insufficient role", body = AnalyticsErrorResponse),
        (status = 500, description = "Internal error", body = AnalyticsErrorResponse)
    ),
    tag = "analitica",
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth))]
pub async fn report_pdf(
	RequireStats(_auth): RequireStats,
	State(state): State<AppState>,
	Query(query): Query<ReportPdfQuery>,
) -> impl IntoResponse {
	report_pdf_impl(state.analytics_state.clone(), query)
		.await
		.into_response()
}

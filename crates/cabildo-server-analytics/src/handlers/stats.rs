// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Aggregate reporting endpoints. All of them are pure reads.

use axum::{
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::instrument;

use cabildo_server_api::{
	DailyPageviewsQuery, DailyPageviewsRow, ReportPdfQuery, SessionListQuery, SessionListRow,
	StatsSummaryQuery, StatsSummaryResponse, TopPagesQuery, TopPagesRow,
};

use crate::report::{render_report, ReportData};
use crate::repository::{AnalyticsRepository, StatsFilter, StatsSummary};

use super::capture::{error_response, internal_error};
use super::AnalyticsState;

const MAX_DAYS: u32 = 365;
const MAX_LIMIT: u32 = 100;
const MAX_SESSION_LIMIT: u32 = 500;

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

fn shape_summary(summary: &StatsSummary) -> StatsSummaryResponse {
	// Bounce rate over a zero-session window is 0, not NaN.
	let bounce_rate = if summary.total_sessions == 0 {
		0.0
	} else {
		summary.bounced_sessions as f64 / summary.total_sessions as f64 * 100.0
	};

	StatsSummaryResponse {
		total_sessions: summary.total_sessions,
		total_visitors: summary.total_visitors,
		total_pageviews: summary.total_pageviews,
		bounce_rate: round2(bounce_rate),
		avg_session_seconds: round2(summary.avg_session_seconds),
		avg_page_seconds: round2(summary.avg_page_seconds),
	}
}

fn validate_range(
	start: Option<chrono::DateTime<Utc>>,
	end: Option<chrono::DateTime<Utc>>,
) -> Result<(), &'static str> {
	if let (Some(start), Some(end)) = (start, end) {
		if start > end {
			return Err("start must not be after end");
		}
	}
	Ok(())
}

#[instrument(skip(state, query))]
pub async fn stats_summary_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	query: StatsSummaryQuery,
) -> impl IntoResponse {
	if let Err(msg) = validate_range(query.start, query.end) {
		return error_response("invalid_range", msg).into_response();
	}

	let filter = StatsFilter {
		start: query.start,
		end: query.end,
		pais: query.pais,
		dispositivo: query.dispositivo,
	};

	match state.repository.stats_summary(&filter).await {
		Ok(summary) => (StatusCode::OK, Json(shape_summary(&summary))).into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute stats summary");
			internal_error("Failed to compute summary").into_response()
		}
	}
}

#[instrument(skip(state, query), fields(days = query.days))]
pub async fn daily_pageviews_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	query: DailyPageviewsQuery,
) -> impl IntoResponse {
	if query.days == 0 || query.days > MAX_DAYS {
		return error_response("invalid_days", "days must be between 1 and 365").into_response();
	}

	let since = Utc::now() - Duration::days(i64::from(query.days));

	match state.repository.daily_pageviews(since).await {
		Ok(rows) => {
			let rows: Vec<DailyPageviewsRow> = rows
				.into_iter()
				.map(|(date, views)| DailyPageviewsRow { date, views })
				.collect();
			(StatusCode::OK, Json(rows)).into_response()
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute daily pageviews");
			internal_error("Failed to compute daily pageviews").into_response()
		}
	}
}

#[instrument(skip(state, query), fields(limit = query.limit))]
pub async fn top_pages_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	query: TopPagesQuery,
) -> impl IntoResponse {
	if query.limit == 0 || query.limit > MAX_LIMIT {
		return error_response("invalid_limit", "limit must be between 1 and 100").into_response();
	}

	match state.repository.top_pages(&StatsFilter::default(), query.limit).await {
		Ok(rows) => {
			let rows: Vec<TopPagesRow> = rows
				.into_iter()
				.map(|(ruta, views)| TopPagesRow { ruta, views })
				.collect();
			(StatusCode::OK, Json(rows)).into_response()
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute top pages");
			internal_error("Failed to compute top pages").into_response()
		}
	}
}

#[instrument(skip(state, query), fields(limit = query.limit))]
pub async fn list_sessions_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	query: SessionListQuery,
) -> impl IntoResponse {
	if let Err(msg) = validate_range(query.start, query.end) {
		return error_response("invalid_range", msg).into_response();
	}
	if query.limit == 0 || query.limit > MAX_SESSION_LIMIT {
		return error_response("invalid_limit", "limit must be between 1 and 500").into_response();
	}

	let filter = StatsFilter {
		start: query.start,
		end: query.end,
		pais: query.pais,
		dispositivo: None,
	};

	match state
		.repository
		.list_sessions(&filter, query.es_rebote, query.limit)
		.await
	{
		Ok(sessions) => {
			let rows: Vec<SessionListRow> = sessions
				.into_iter()
				.map(|s| SessionListRow {
					sesion_id: s.sesion_id,
					visitante_id: s.visitante_id,
					inicio: s.inicio,
					fin: s.fin,
					duracion_segundos: s.duracion_segundos,
					conteo_paginas: s.conteo_paginas,
					es_rebote: s.es_rebote,
				})
				.collect();
			(StatusCode::OK, Json(rows)).into_response()
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to list sessions");
			internal_error("Failed to list sessions").into_response()
		}
	}
}

#[instrument(skip(state, query))]
pub async fn report_pdf_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	query: ReportPdfQuery,
) -> impl IntoResponse {
	if let Err(msg) = validate_range(query.start, query.end) {
		return error_response("invalid_range", msg).into_response();
	}
	if query.limit == 0 || query.limit > MAX_LIMIT {
		return error_response("invalid_limit", "limit must be between 1 and 100").into_response();
	}

	let filter = StatsFilter {
		start: query.start,
		end: query.end,
		..StatsFilter::default()
	};

	let summary = match state.repository.stats_summary(&filter).await {
		Ok(summary) => summary,
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute report summary");
			return internal_error("Failed to generate report").into_response();
		}
	};

	let top_pages = match state.repository.top_pages(&filter, query.limit).await {
		Ok(rows) => rows,
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute report top pages");
			return internal_error("Failed to generate report").into_response();
		}
	};

	let data = ReportData {
		generated_at: Utc::now(),
		start: query.start,
		end: query.end,
		summary: shape_summary(&summary),
		top_pages,
	};

	(
		StatusCode::OK,
		[
			(header::CONTENT_TYPE, "application/pdf"),
			(
				header::CONTENT_DISPOSITION,
				"attachment; filename=\"analitica_web.pdf\"",
			),
		],
		render_report(&data),
	)
		.into_response()
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request/response types for the web-analytics endpoints.
//!
//! Field names match the wire contract of the public tracking script
//! (`visitante_id`, `sesion_id`, `ruta`, ...); they are part of the API and
//! must not be renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Error response for analytics endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AnalyticsErrorResponse {
	pub error: String,
	pub message: String,
}

/// Body for `POST /sessions/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionStartRequest {
	/// Opaque client-generated visitor token. Older tracking script builds
	/// sent this field as `visitor_id`.
	#[serde(alias = "visitor_id")]
	pub visitante_id: String,
	pub sesion_id: String,
	#[serde(default)]
	pub user_agent: Option<String>,
	#[serde(default)]
	pub inicio: Option<DateTime<Utc>>,
}

/// Response for `POST /sessions/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionStartResponse {
	pub sesion_id: String,
	pub created: bool,
}

/// Body for `POST /sessions/end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionEndRequest {
	pub visitante_id: String,
	pub sesion_id: String,
	#[serde(default)]
	pub fin: Option<DateTime<Utc>>,
}

/// Response for `POST /sessions/end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionEndResponse {
	pub sesion_id: String,
	pub duracion: i64,
	pub es_rebote: bool,
}

/// One page view in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PageViewItemRequest {
	pub visitante_id: String,
	pub sesion_id: String,
	pub ruta: String,
	#[serde(default)]
	pub nombre_pagina: Option<String>,
	#[serde(default)]
	pub hora: Option<DateTime<Utc>>,
	#[serde(default)]
	pub tiempo_en_pagina: Option<f64>,
	#[serde(default)]
	pub referencia: Option<String>,
	#[serde(default)]
	pub utm_data: Option<serde_json::Value>,
	#[serde(default)]
	pub user_agent: Option<String>,
}

/// Body for `POST /pageviews/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PageViewBatchRequest {
	pub items: Vec<PageViewItemRequest>,
}

/// One event in a batch. `sesion_id` is optional: conversion/error events may
/// arrive outside any session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventItemRequest {
	pub visitante_id: String,
	#[serde(default)]
	pub sesion_id: Option<String>,
	pub tipo: String,
	pub nombre: String,
	#[serde(default)]
	pub ruta: Option<String>,
	#[serde(default)]
	pub hora: Option<DateTime<Utc>>,
	#[serde(default)]
	pub metadata: Option<serde_json::Value>,
}

/// Body for `POST /events/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventBatchRequest {
	pub items: Vec<EventItemRequest>,
}

/// Response for batch ingestion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BatchCreatedResponse {
	pub created: u64,
}

/// Query for `GET /stats/summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct StatsSummaryQuery {
	#[serde(default)]
	pub start: Option<DateTime<Utc>>,
	#[serde(default)]
	pub end: Option<DateTime<Utc>>,
	#[serde(default)]
	pub pais: Option<String>,
	#[serde(default)]
	pub dispositivo: Option<String>,
}

/// Response for `GET /stats/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StatsSummaryResponse {
	pub total_sessions: u64,
	pub total_visitors: u64,
	pub total_pageviews: u64,
	/// Percentage, rounded to two decimals.
	pub bounce_rate: f64,
	pub avg_session_seconds: f64,
	pub avg_page_seconds: f64,
}

/// Query for `GET /stats/pageviews/daily`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct DailyPageviewsQuery {
	#[serde(default = "default_days")]
	pub days: u32,
}

fn default_days() -> u32 {
	30
}

impl Default for DailyPageviewsQuery {
	fn default() -> Self {
		Self {
			days: default_days(),
		}
	}
}

/// One bucket in the daily pageviews response, chronologically ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DailyPageviewsRow {
	/// Calendar date, `YYYY-MM-DD`.
	pub date: String,
	pub views: u64,
}

/// Query for `GET /stats/pages/top`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct TopPagesQuery {
	#[serde(default = "default_limit")]
	pub limit: u32,
}

fn default_limit() -> u32 {
	10
}

impl Default for TopPagesQuery {
	fn default() -> Self {
		Self {
			limit: default_limit(),
		}
	}
}

/// One row in the top-pages response, ordered by views descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TopPagesRow {
	pub ruta: String,
	pub views: u64,
}

/// Query for `GET /stats/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct SessionListQuery {
	#[serde(default)]
	pub start: Option<DateTime<Utc>>,
	#[serde(default)]
	pub end: Option<DateTime<Utc>>,
	#[serde(default)]
	pub es_rebote: Option<bool>,
	#[serde(default)]
	pub pais: Option<String>,
	#[serde(default = "default_session_limit")]
	pub limit: u32,
}

fn default_session_limit() -> u32 {
	50
}

impl Default for SessionListQuery {
	fn default() -> Self {
		Self {
			start: None,
			end: None,
			es_rebote: None,
			pais: None,
			limit: default_session_limit(),
		}
	}
}

/// One session in the listing response, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SessionListRow {
	pub sesion_id: String,
	pub visitante_id: String,
	pub inicio: DateTime<Utc>,
	pub fin: Option<DateTime<Utc>>,
	pub duracion_segundos: Option<i64>,
	pub conteo_paginas: i64,
	pub es_rebote: bool,
}

/// Query for `GET /stats/report/pdf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ReportPdfQuery {
	#[serde(default)]
	pub start: Option<DateTime<Utc>>,
	#[serde(default)]
	pub end: Option<DateTime<Utc>>,
	#[serde(default = "default_limit")]
	pub limit: u32,
}

impl Default for ReportPdfQuery {
	fn default() -> Self {
		Self {
			start: None,
			end: None,
			limit: default_limit(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_start_accepts_legacy_visitor_id_field() {
		let req: SessionStartRequest =
			serde_json::from_str(r#"{"visitor_id": "v1", "sesion_id": "s1"}"#).unwrap();
		assert_eq!(req.visitante_id, "v1");
		assert!(req.inicio.is_none());
	}

	#[test]
	fn session_start_requires_session_id() {
		let res: Result<SessionStartRequest, _> =
			serde_json::from_str(r#"{"visitante_id": "v1"}"#);
		assert!(res.is_err());
	}

	#[test]
	fn daily_query_defaults_to_thirty_days() {
		let q: DailyPageviewsQuery = serde_json::from_str("{}").unwrap();
		assert_eq!(q.days, 30);
	}

	#[test]
	fn top_pages_query_defaults_to_ten() {
		let q: TopPagesQuery = serde_json::from_str("{}").unwrap();
		assert_eq!(q.limit, 10);
	}

	#[test]
	fn event_item_session_is_optional() {
		let item: EventItemRequest = serde_json::from_str(
			r#"{"visitante_id": "v2", "tipo": "conversion", "nombre": "tramite_enviado"}"#,
		)
		.unwrap();
		assert!(item.sesion_id.is_none());
	}
}

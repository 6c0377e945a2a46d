// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch ingestion endpoints for pageviews and events.
//!
//! Every item in a batch is validated before any persistence happens. Items
//! are then persisted sequentially, fail-fast, without rolling back earlier
//! items of the same batch; the `created` count is only returned when the
//! whole batch succeeded.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use cabildo_analytics_core::{Event, EventType, PageView, Session, Visitor};
use cabildo_server_api::{
	AnalyticsErrorResponse, BatchCreatedResponse, EventBatchRequest, EventItemRequest,
	PageViewBatchRequest, PageViewItemRequest,
};

use crate::repository::AnalyticsRepository;

use super::sessions::resolve_signature;
use super::AnalyticsState;

const MAX_IDENTIFIER_LENGTH: usize = 255;
const MAX_RUTA_LENGTH: usize = 2000;
const MAX_NOMBRE_LENGTH: usize = 500;
const MAX_PAYLOAD_SIZE: usize = 1024 * 1024; // 1MB
const MAX_BATCH_SIZE: usize = 100;

pub(super) fn error_response(error: &str, message: &str) -> impl IntoResponse {
	(
		StatusCode::BAD_REQUEST,
		Json(AnalyticsErrorResponse {
			error: error.to_string(),
			message: message.to_string(),
		}),
	)
}

pub(super) fn internal_error(message: &str) -> impl IntoResponse {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(AnalyticsErrorResponse {
			error: "internal_error".to_string(),
			message: message.to_string(),
		}),
	)
}

pub(super) fn validate_identifier(value: &str) -> Result<(), &'static str> {
	if value.is_empty() {
		return Err("Identifier cannot be empty");
	}
	if value.len() > MAX_IDENTIFIER_LENGTH {
		return Err("Identifier exceeds maximum length");
	}
	Ok(())
}

fn validate_ruta(ruta: &str) -> Result<(), &'static str> {
	if ruta.is_empty() {
		return Err("Ruta cannot be empty");
	}
	if ruta.len() > MAX_RUTA_LENGTH {
		return Err("Ruta exceeds maximum length");
	}
	Ok(())
}

fn validate_payload(payload: &serde_json::Value) -> Result<(), &'static str> {
	let serialized = serde_json::to_string(payload).unwrap_or_default();
	if serialized.len() > MAX_PAYLOAD_SIZE {
		return Err("Payload exceeds maximum size");
	}
	Ok(())
}

fn validate_pageview_item(item: &PageViewItemRequest) -> Result<(), (&'static str, String)> {
	validate_identifier(&item.visitante_id).map_err(|m| ("invalid_visitante_id", m.to_string()))?;
	validate_identifier(&item.sesion_id).map_err(|m| ("invalid_sesion_id", m.to_string()))?;
	validate_ruta(&item.ruta).map_err(|m| ("invalid_ruta", m.to_string()))?;
	if let Some(t) = item.tiempo_en_pagina {
		if !t.is_finite() || t < 0.0 {
			return Err((
				"invalid_tiempo_en_pagina",
				"Time on page must be a non-negative number of seconds".to_string(),
			));
		}
	}
	if let Some(utm) = &item.utm_data {
		validate_payload(utm).map_err(|m| ("invalid_utm_data", m.to_string()))?;
	}
	Ok(())
}

fn validate_event_item(item: &EventItemRequest) -> Result<EventType, (&'static str, String)> {
	validate_identifier(&item.visitante_id).map_err(|m| ("invalid_visitante_id", m.to_string()))?;
	let tipo: EventType = item
		.tipo
		.parse()
		.map_err(|_| ("invalid_tipo", format!("Unknown event type '{}'", item.tipo)))?;
	if item.nombre.is_empty() || item.nombre.len() > MAX_NOMBRE_LENGTH {
		return Err(("invalid_nombre", "Event name must be 1-500 characters".to_string()));
	}
	if let Some(metadata) = &item.metadata {
		validate_payload(metadata).map_err(|m| ("invalid_metadata", m.to_string()))?;
	}
	Ok(tipo)
}

/// Single-record ingestion, a one-item batch on the wire since the tracking
/// script falls back to per-record posts when batching is unavailable.
pub async fn create_pageview_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	item: PageViewItemRequest,
) -> impl IntoResponse {
	batch_pageviews_impl(state, PageViewBatchRequest { items: vec![item] }).await
}

/// Single-record event ingestion. See [`create_pageview_impl`].
pub async fn create_event_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	item: EventItemRequest,
) -> impl IntoResponse {
	batch_events_impl(state, EventBatchRequest { items: vec![item] }).await
}

#[instrument(skip(state, payload), fields(items = payload.items.len()))]
pub async fn batch_pageviews_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	payload: PageViewBatchRequest,
) -> impl IntoResponse {
	if payload.items.is_empty() {
		return error_response("empty_batch", "Batch cannot be empty").into_response();
	}
	if payload.items.len() > MAX_BATCH_SIZE {
		return error_response("batch_too_large", "Batch cannot exceed 100 items").into_response();
	}

	// Validate every item before persisting anything.
	for (i, item) in payload.items.iter().enumerate() {
		if let Err((error, msg)) = validate_pageview_item(item) {
			return error_response(error, &format!("Item {i}: {msg}")).into_response();
		}
	}

	let now = Utc::now();
	let mut created = 0u64;

	for item in payload.items {
		let signature_id = match resolve_signature(&state, item.user_agent.as_deref()).await {
			Ok(id) => id,
			Err(response) => return response,
		};

		let visitor = match state
			.repository
			.get_or_create_visitor(&Visitor::new(item.visitante_id.clone(), signature_id))
			.await
		{
			Ok((visitor, _)) => visitor,
			Err(e) => {
				tracing::error!(error = %e, "Failed to resolve visitor for pageview");
				return internal_error("Failed to ingest pageviews").into_response();
			}
		};

		// A pageview may arrive before the explicit session start; the
		// session is created here with the pageview timestamp as its start.
		let hora = item.hora.unwrap_or(now);
		let candidate = Session::new(item.sesion_id.clone(), visitor.id, hora);
		let (session, _) = match state.repository.get_or_create_session(&candidate).await {
			Ok(result) => result,
			Err(e) => {
				tracing::error!(error = %e, "Failed to resolve session for pageview");
				return internal_error("Failed to ingest pageviews").into_response();
			}
		};

		let mut pageview = PageView::new(session.id, item.ruta, hora);
		pageview.nombre_pagina = item.nombre_pagina.unwrap_or_default();
		// Validated finite and non-negative, so rounding to whole seconds is exact.
		pageview.tiempo_en_pagina = item.tiempo_en_pagina.map(|t| t.round() as i64);
		pageview.referencia = item.referencia.unwrap_or_default();
		if let Some(utm) = item.utm_data {
			pageview.utm_data = utm;
		}
		pageview.user_agent_id = signature_id;

		if let Err(e) = state.repository.insert_pageview(&pageview).await {
			tracing::error!(error = %e, "Failed to insert pageview");
			return internal_error("Failed to ingest pageviews").into_response();
		}

		// Last-activity follows the item's own timestamp so backdated views do
		// not push it forward.
		if let Err(e) = state.repository.record_page_activity(session.id, hora).await {
			tracing::error!(error = %e, "Failed to bump session page count");
			return internal_error("Failed to ingest pageviews").into_response();
		}

		created += 1;
	}

	(StatusCode::CREATED, Json(BatchCreatedResponse { created })).into_response()
}

#[instrument(skip(state, payload), fields(items = payload.items.len()))]
pub async fn batch_events_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	payload: EventBatchRequest,
) -> impl IntoResponse {
	if payload.items.is_empty() {
		return error_response("empty_batch", "Batch cannot be empty").into_response();
	}
	if payload.items.len() > MAX_BATCH_SIZE {
		return error_response("batch_too_large", "Batch cannot exceed 100 items").into_response();
	}

	let mut tipos = Vec::with_capacity(payload.items.len());
	for (i, item) in payload.items.iter().enumerate() {
		match validate_event_item(item) {
			Ok(tipo) => tipos.push(tipo),
			Err((error, msg)) => {
				return error_response(error, &format!("Item {i}: {msg}")).into_response();
			}
		}
	}

	let now = Utc::now();
	let mut created = 0u64;

	for (item, tipo) in payload.items.into_iter().zip(tipos) {
		let visitor = match state
			.repository
			.get_or_create_visitor(&Visitor::new(item.visitante_id.clone(), None))
			.await
		{
			Ok((visitor, _)) => visitor,
			Err(e) => {
				tracing::error!(error = %e, "Failed to resolve visitor for event");
				return internal_error("Failed to ingest events").into_response();
			}
		};

		// The session reference is weak: only attached when the supplied ID
		// matches a session owned by this visitor, otherwise the event is
		// stored session-less.
		let session = match item.sesion_id.as_deref().filter(|s| !s.is_empty()) {
			Some(sesion_id) => {
				match state
					.repository
					.find_session_for_visitor(sesion_id, &item.visitante_id)
					.await
				{
					Ok(session) => session,
					Err(e) => {
						tracing::error!(error = %e, "Failed to resolve session for event");
						return internal_error("Failed to ingest events").into_response();
					}
				}
			}
			None => None,
		};

		let mut event = Event::new(visitor.id, tipo, item.nombre, item.hora.unwrap_or(now));
		event.sesion_id = session.map(|s| s.id);
		event.ruta = item.ruta.unwrap_or_default();
		if let Some(metadata) = item.metadata {
			event.metadata = metadata;
		}

		if let Err(e) = state.repository.insert_event(&event).await {
			tracing::error!(error = %e, "Failed to insert event");
			return internal_error("Failed to ingest events").into_response();
		}

		created += 1;
	}

	(StatusCode::CREATED, Json(BatchCreatedResponse { created })).into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn validate_identifier_bounds() {
		assert!(validate_identifier("v1").is_ok());
		assert!(validate_identifier("").is_err());
		assert!(validate_identifier(&"a".repeat(256)).is_err());
	}

	#[test]
	fn validate_ruta_bounds() {
		assert!(validate_ruta("/tramites/licencias").is_ok());
		assert!(validate_ruta("").is_err());
		assert!(validate_ruta(&"/x".repeat(1001)).is_err());
	}

	#[test]
	fn validate_pageview_item_rejects_bad_tiempo() {
		let item = |tiempo| PageViewItemRequest {
			visitante_id: "v1".to_string(),
			sesion_id: "s1".to_string(),
			ruta: "/tramites".to_string(),
			nombre_pagina: None,
			hora: None,
			tiempo_en_pagina: tiempo,
			referencia: None,
			utm_data: None,
			user_agent: None,
		};
		assert!(validate_pageview_item(&item(Some(12.4))).is_ok());
		assert!(validate_pageview_item(&item(None)).is_ok());
		assert!(validate_pageview_item(&item(Some(-1.0))).is_err());
		assert!(validate_pageview_item(&item(Some(f64::NAN))).is_err());
		assert!(validate_pageview_item(&item(Some(f64::INFINITY))).is_err());
	}

	#[test]
	fn validate_payload_rejects_oversized_json() {
		let large = "x".repeat(MAX_PAYLOAD_SIZE + 1);
		assert!(validate_payload(&serde_json::json!({ "data": large })).is_err());
		assert!(validate_payload(&serde_json::json!({"utm_source": "portal"})).is_ok());
	}

	#[test]
	fn validate_event_item_checks_tipo() {
		let item = EventItemRequest {
			visitante_id: "v1".to_string(),
			sesion_id: None,
			tipo: "clic".to_string(),
			nombre: "boton".to_string(),
			ruta: None,
			hora: None,
			metadata: None,
		};
		assert!(validate_event_item(&item).is_err());

		let item = EventItemRequest {
			tipo: "conversion".to_string(),
			..item
		};
		assert_eq!(validate_event_item(&item).unwrap(), EventType::Conversion);
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle endpoints: start and end.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use cabildo_analytics_core::{ClientSignature, Session, SessionClose, Visitor};
use cabildo_server_api::{
	AnalyticsErrorResponse, SessionEndRequest, SessionEndResponse, SessionStartRequest,
	SessionStartResponse,
};

use crate::repository::AnalyticsRepository;

use super::capture::{error_response, internal_error, validate_identifier};
use super::AnalyticsState;

#[instrument(skip(state, payload), fields(sesion_id = %payload.sesion_id))]
pub async fn start_session_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	payload: SessionStartRequest,
) -> impl IntoResponse {
	if let Err(msg) = validate_identifier(&payload.visitante_id) {
		return error_response("invalid_visitante_id", msg).into_response();
	}
	if let Err(msg) = validate_identifier(&payload.sesion_id) {
		return error_response("invalid_sesion_id", msg).into_response();
	}

	let signature_id = match resolve_signature(&state, payload.user_agent.as_deref()).await {
		Ok(id) => id,
		Err(response) => return response,
	};

	let visitor = match state
		.repository
		.get_or_create_visitor(&Visitor::new(payload.visitante_id.clone(), signature_id))
		.await
	{
		Ok((visitor, _)) => visitor,
		Err(e) => {
			tracing::error!(error = %e, "Failed to resolve visitor");
			return internal_error("Failed to start session").into_response();
		}
	};

	let inicio = payload.inicio.unwrap_or_else(Utc::now);
	let candidate = Session::new(payload.sesion_id.clone(), visitor.id, inicio);

	let (session, created) = match state.repository.get_or_create_session(&candidate).await {
		Ok(result) => result,
		Err(e) => {
			tracing::error!(error = %e, "Failed to resolve session");
			return internal_error("Failed to start session").into_response();
		}
	};

	// A session started under a stale or missing visitor linkage is corrected
	// to the caller's visitor (last-writer-wins, not an error).
	if !created && session.visitante_id != visitor.id {
		if let Err(e) = state
			.repository
			.relink_session_visitor(session.id, visitor.id)
			.await
		{
			tracing::error!(error = %e, "Failed to relink session visitor");
			return internal_error("Failed to start session").into_response();
		}
	}

	(
		StatusCode::CREATED,
		Json(SessionStartResponse {
			sesion_id: session.sesion_id,
			created,
		}),
	)
		.into_response()
}

#[instrument(skip(state, payload), fields(sesion_id = %payload.sesion_id))]
pub async fn end_session_impl<R: AnalyticsRepository>(
	state: Arc<AnalyticsState<R>>,
	payload: SessionEndRequest,
) -> impl IntoResponse {
	if let Err(msg) = validate_identifier(&payload.visitante_id) {
		return error_response("invalid_visitante_id", msg).into_response();
	}
	if let Err(msg) = validate_identifier(&payload.sesion_id) {
		return error_response("invalid_sesion_id", msg).into_response();
	}

	// Contract check: a session cannot be closed under the wrong visitor.
	let session = match state
		.repository
		.find_session_for_visitor(&payload.sesion_id, &payload.visitante_id)
		.await
	{
		Ok(Some(session)) => session,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(AnalyticsErrorResponse {
					error: "session_not_found".to_string(),
					message: "No session with that ID exists for this visitor".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to look up session");
			return internal_error("Failed to end session").into_response();
		}
	};

	// Termination is idempotent: a second end call returns the values fixed
	// at the first close without recomputing against the new timestamp.
	if let Some(fin) = session.fin {
		let duracion = session
			.duracion_segundos
			.unwrap_or_else(|| (fin - session.inicio).num_seconds());
		return (
			StatusCode::OK,
			Json(SessionEndResponse {
				sesion_id: session.sesion_id,
				duracion,
				es_rebote: session.es_rebote,
			}),
		)
			.into_response();
	}

	let fin = payload.fin.unwrap_or_else(Utc::now);
	let close = SessionClose::compute(session.inicio, fin, session.conteo_paginas);

	match state.repository.close_session_if_open(session.id, &close).await {
		Ok(true) => (
			StatusCode::OK,
			Json(SessionEndResponse {
				sesion_id: session.sesion_id,
				duracion: close.duracion_segundos,
				es_rebote: close.es_rebote,
			}),
		)
			.into_response(),
		// Lost the close race: another request terminated the session first,
		// report the values it fixed.
		Ok(false) => match state.repository.get_session_by_key(&payload.sesion_id).await {
			Ok(Some(closed)) => (
				StatusCode::OK,
				Json(SessionEndResponse {
					sesion_id: closed.sesion_id,
					duracion: closed.duracion_segundos.unwrap_or(0),
					es_rebote: closed.es_rebote,
				}),
			)
				.into_response(),
			Ok(None) => internal_error("Failed to end session").into_response(),
			Err(e) => {
				tracing::error!(error = %e, "Failed to re-read closed session");
				internal_error("Failed to end session").into_response()
			}
		},
		Err(e) => {
			tracing::error!(error = %e, "Failed to close session");
			internal_error("Failed to end session").into_response()
		}
	}
}

pub(super) async fn resolve_signature<R: AnalyticsRepository>(
	state: &Arc<AnalyticsState<R>>,
	user_agent: Option<&str>,
) -> Result<Option<uuid::Uuid>, axum::response::Response> {
	// Empty or absent agent strings carry no signature; that is not an error.
	let Some(candidate) = user_agent.and_then(ClientSignature::from_raw) else {
		return Ok(None);
	};

	match state.repository.get_or_create_signature(&candidate).await {
		Ok(signature) => Ok(Some(signature.id)),
		Err(e) => {
			tracing::error!(error = %e, "Failed to resolve user-agent signature");
			Err(internal_error("Failed to resolve user agent").into_response())
		}
	}
}

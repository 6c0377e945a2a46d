// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-gated access for the reporting endpoints.
//!
//! Credential issuance is external to this subsystem; the server only maps a
//! configured bearer token to a role and checks the capability required by
//! the endpoint. Ingestion endpoints are public and bypass this entirely.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};

use cabildo_server_api::AnalyticsErrorResponse;

/// Closed set of caller roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
	Admin,
	Funcionario,
	Ciudadano,
}

impl Role {
	/// Capability check for the aggregate reporting endpoints.
	#[must_use]
	pub fn can_view_stats(self) -> bool {
		matches!(self, Role::Admin | Role::Funcionario)
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Role::Admin => write!(f, "admin"),
			Role::Funcionario => write!(f, "funcionario"),
			Role::Ciudadano => write!(f, "ciudadano"),
		}
	}
}

/// Authenticated context for a reporting request.
#[derive(Debug, Clone)]
pub struct StatsAuthContext {
	pub role: Role,
}

/// Errors that can occur while authenticating a reporting request.
pub enum StatsAuthError {
	/// No Authorization header was provided.
	MissingAuthorization,
	/// The Authorization header format is invalid.
	InvalidFormat,
	/// The bearer token does not match any configured credential.
	InvalidToken,
	/// The caller's role lacks the required capability.
	Forbidden,
}

impl IntoResponse for StatsAuthError {
	fn into_response(self) -> Response {
		let (status, error, message) = match self {
			Self::MissingAuthorization => (
				StatusCode::UNAUTHORIZED,
				"missing_authorization",
				"Authorization header is required",
			),
			Self::InvalidFormat => (
				StatusCode::UNAUTHORIZED,
				"invalid_format",
				"Invalid authorization header format",
			),
			Self::InvalidToken => (
				StatusCode::UNAUTHORIZED,
				"invalid_token",
				"Invalid credentials",
			),
			Self::Forbidden => (
				StatusCode::FORBIDDEN,
				"forbidden",
				"Insufficient role for analytics reporting",
			),
		};

		(
			status,
			Json(AnalyticsErrorResponse {
				error: error.to_string(),
				message: message.to_string(),
			}),
		)
			.into_response()
	}
}

/// Extracts the token from a "Bearer <token>" Authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
	auth_header.strip_prefix("Bearer ")
}

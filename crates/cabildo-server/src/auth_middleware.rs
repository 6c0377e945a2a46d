// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request extractor gating the reporting endpoints by role.

use axum::{extract::FromRequestParts, http::request::Parts};

use cabildo_server_analytics::{extract_bearer_token, Role, StatsAuthContext, StatsAuthError};

use crate::api::AppState;

/// Extractor that requires a bearer token mapped to a role allowed to view
/// analytics reports. Ingestion endpoints do not use this.
pub struct RequireStats(pub StatsAuthContext);

impl FromRequestParts<AppState> for RequireStats {
	type Rejection = StatsAuthError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let header = parts
			.headers
			.get("authorization")
			.ok_or(StatsAuthError::MissingAuthorization)?
			.to_str()
			.map_err(|_| StatsAuthError::InvalidFormat)?;

		let token = extract_bearer_token(header).ok_or(StatsAuthError::InvalidFormat)?;

		let role = resolve_role(state, token).ok_or(StatsAuthError::InvalidToken)?;
		if !role.can_view_stats() {
			return Err(StatsAuthError::Forbidden);
		}

		Ok(RequireStats(StatsAuthContext { role }))
	}
}

fn resolve_role(state: &AppState, token: &str) -> Option<Role> {
	if state.stats_auth.admin_token.as_deref() == Some(token) {
		return Some(Role::Admin);
	}
	if state.stats_auth.funcionario_token.as_deref() == Some(token) {
		return Some(Role::Funcionario);
	}
	if state.stats_auth.ciudadano_token.as_deref() == Some(token) {
		return Some(Role::Ciudadano);
	}
	None
}

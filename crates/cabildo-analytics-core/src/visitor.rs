// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Visitor identity, the aggregation root for sessions and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persistent identity for a returning client, keyed by an opaque
/// client-supplied token (`visitante_id` on the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Visitor {
	pub id: Uuid,
	/// Opaque client-supplied token.
	pub visitante_id: String,
	/// Set once, at creation.
	pub primera_visita: DateTime<Utc>,
	/// Bumped on every visitor-touching operation.
	pub ultima_visita: DateTime<Utc>,
	/// Signature attached at creation only; never overwritten afterwards.
	pub user_agent_id: Option<Uuid>,

	// Advisory network/geo attributes, not required for correctness.
	pub ip: Option<String>,
	pub tipo_dispositivo: Option<String>,
	pub pais: Option<String>,
	pub ciudad: Option<String>,
}

impl Visitor {
	#[must_use]
	pub fn new(visitante_id: String, user_agent_id: Option<Uuid>) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::now_v7(),
			visitante_id,
			primera_visita: now,
			ultima_visita: now,
			user_agent_id,
			ip: None,
			tipo_dispositivo: None,
			pais: None,
			ciudad: None,
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Individual page views, owned by exactly one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page view within a session. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageView {
	pub id: Uuid,
	/// Owning session (row id).
	pub sesion_id: Uuid,
	pub ruta: String,
	pub nombre_pagina: String,
	pub hora: DateTime<Utc>,
	/// Seconds the visitor spent on the page, when the client reported it.
	pub tiempo_en_pagina: Option<i64>,
	pub referencia: String,
	/// Free-form UTM attribution payload.
	pub utm_data: serde_json::Value,
	pub user_agent_id: Option<Uuid>,
}

impl PageView {
	#[must_use]
	pub fn new(sesion_id: Uuid, ruta: String, hora: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::now_v7(),
			sesion_id,
			ruta,
			nombre_pagina: String::new(),
			hora,
			tiempo_en_pagina: None,
			referencia: String::new(),
			utm_data: serde_json::Value::Object(serde_json::Map::new()),
			user_agent_id: None,
		}
	}
}

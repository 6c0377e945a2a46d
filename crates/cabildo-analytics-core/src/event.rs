// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed analytics events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of event type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EventType {
	PageView,
	CustomEvent,
	Conversion,
	Error,
}

impl std::fmt::Display for EventType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EventType::PageView => write!(f, "page_view"),
			EventType::CustomEvent => write!(f, "custom_event"),
			EventType::Conversion => write!(f, "conversion"),
			EventType::Error => write!(f, "error"),
		}
	}
}

impl std::str::FromStr for EventType {
	type Err = crate::error::AnalyticsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"page_view" => Ok(EventType::PageView),
			"custom_event" => Ok(EventType::CustomEvent),
			"conversion" => Ok(EventType::Conversion),
			"error" => Ok(EventType::Error),
			_ => Err(crate::error::AnalyticsError::InvalidEventType(s.to_string())),
		}
	}
}

/// An analytics event. Always belongs to a visitor; the session reference is
/// weak — custom/conversion/error events may arrive without one and survive
/// its absence. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Event {
	pub id: Uuid,
	/// Optional owning session (row id).
	pub sesion_id: Option<Uuid>,
	/// Owning visitor (row id), always present.
	pub visitante_id: Uuid,
	pub tipo: EventType,
	pub nombre: String,
	pub ruta: String,
	pub hora: DateTime<Utc>,
	/// Free-form metadata map.
	pub metadata: serde_json::Value,
}

impl Event {
	#[must_use]
	pub fn new(visitante_id: Uuid, tipo: EventType, nombre: String, hora: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::now_v7(),
			sesion_id: None,
			visitante_id,
			tipo,
			nombre,
			ruta: String::new(),
			hora,
			metadata: serde_json::Value::Object(serde_json::Map::new()),
		}
	}
}

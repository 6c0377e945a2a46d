// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Browsing session types and close-of-session derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded browsing episode for a visitor.
///
/// Lifecycle: Open (`fin` is `None`) → Closed. Once closed, `fin`,
/// `duracion_segundos` and `es_rebote` are fixed permanently; page-view
/// ingestion after close is accepted but never reopens the session or
/// re-derives the bounce flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
	pub id: Uuid,
	/// Client-supplied session identifier, globally unique.
	pub sesion_id: String,
	/// Owning visitor (row id).
	pub visitante_id: Uuid,
	pub inicio: DateTime<Utc>,
	pub fin: Option<DateTime<Utc>>,
	/// Derived, set only at termination.
	pub duracion_segundos: Option<i64>,
	/// Incremented by each ingested page-view belonging to this session.
	pub conteo_paginas: i64,
	/// Derived, set only at termination.
	pub es_rebote: bool,
	pub ultima_actividad: Option<DateTime<Utc>>,
}

impl Session {
	#[must_use]
	pub fn new(sesion_id: String, visitante_id: Uuid, inicio: DateTime<Utc>) -> Self {
		Self {
			id: Uuid::now_v7(),
			sesion_id,
			visitante_id,
			inicio,
			fin: None,
			duracion_segundos: None,
			conteo_paginas: 0,
			es_rebote: false,
			ultima_actividad: None,
		}
	}

	#[must_use]
	pub fn is_open(&self) -> bool {
		self.fin.is_none()
	}
}

/// Values derived by the Open→Closed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClose {
	pub fin: DateTime<Utc>,
	pub duracion_segundos: i64,
	pub es_rebote: bool,
}

impl SessionClose {
	/// Computes the derived fields at the moment of closing: duration is the
	/// start→end difference truncated to whole seconds, bounce means the
	/// session saw at most one page view.
	#[must_use]
	pub fn compute(inicio: DateTime<Utc>, fin: DateTime<Utc>, conteo_paginas: i64) -> Self {
		Self {
			fin,
			duracion_segundos: (fin - inicio).num_seconds(),
			es_rebote: conteo_paginas <= 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};
	use proptest::prelude::*;

	fn t0() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
	}

	proptest! {
		#[test]
		fn duration_truncates_to_whole_seconds(secs in 0i64..86_400, millis in 0i64..1000) {
			let fin = t0() + Duration::seconds(secs) + Duration::milliseconds(millis);
			let close = SessionClose::compute(t0(), fin, 3);
			prop_assert_eq!(close.duracion_segundos, secs);
		}

		#[test]
		fn bounce_iff_at_most_one_page(pages in 0i64..100) {
			let close = SessionClose::compute(t0(), t0() + Duration::seconds(5), pages);
			prop_assert_eq!(close.es_rebote, pages <= 1);
		}
	}

	#[test]
	fn new_session_is_open() {
		let s = Session::new("s1".to_string(), Uuid::now_v7(), t0());
		assert!(s.is_open());
		assert_eq!(s.conteo_paginas, 0);
		assert!(s.duracion_segundos.is_none());
	}

	#[test]
	fn ten_second_single_page_session_bounces() {
		let close = SessionClose::compute(t0(), t0() + Duration::seconds(10), 1);
		assert_eq!(close.duracion_segundos, 10);
		assert!(close.es_rebote);
	}

	#[test]
	fn two_page_session_does_not_bounce() {
		let close = SessionClose::compute(t0(), t0() + Duration::seconds(10), 2);
		assert!(!close.es_rebote);
	}
}

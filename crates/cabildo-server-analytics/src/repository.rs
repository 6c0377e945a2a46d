// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository layer for analytics database operations.
//!
//! Deduplication (signatures, visitors, sessions) relies on unique
//! constraints plus insert-or-ignore-then-fetch; there is no application
//! level locking. The page counter is only ever mutated through a single
//! atomic `UPDATE ... SET conteo_paginas = conteo_paginas + 1`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use cabildo_analytics_core::{
	ClientSignature, Event, PageView, Session, SessionClose, SignatureHash, Visitor,
};

use crate::error::{AnalyticsServerError, Result};

/// Optional dimensional filters for the reporting queries. Time bounds are
/// inclusive and apply to session start / pageview timestamp respectively.
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
	pub start: Option<DateTime<Utc>>,
	pub end: Option<DateTime<Utc>>,
	pub pais: Option<String>,
	pub dispositivo: Option<String>,
}

impl StatsFilter {
	fn start_bound(&self) -> Option<String> {
		self.start.map(|dt| dt.to_rfc3339())
	}

	fn end_bound(&self) -> Option<String> {
		self.end.map(|dt| dt.to_rfc3339())
	}
}

/// One session in a listing, joined with the owning visitor's token.
#[derive(Debug, Clone)]
pub struct SessionListing {
	pub sesion_id: String,
	pub visitante_id: String,
	pub inicio: DateTime<Utc>,
	pub fin: Option<DateTime<Utc>>,
	pub duracion_segundos: Option<i64>,
	pub conteo_paginas: i64,
	pub es_rebote: bool,
}

/// Raw aggregates over the filtered sessions and pageviews. Rate/percentage
/// shaping happens in the handler layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
	pub total_sessions: u64,
	pub total_visitors: u64,
	pub total_pageviews: u64,
	pub bounced_sessions: u64,
	/// Mean of `duracion_segundos` over closed sessions; 0 when none.
	pub avg_session_seconds: f64,
	/// Mean of `tiempo_en_pagina` over timed pageviews; 0 when none.
	pub avg_page_seconds: f64,
}

/// Repository trait for analytics operations.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
	// Identity resolution
	async fn get_or_create_signature(&self, signature: &ClientSignature) -> Result<ClientSignature>;
	async fn get_or_create_visitor(&self, visitor: &Visitor) -> Result<(Visitor, bool)>;

	// Session lifecycle
	async fn get_or_create_session(&self, session: &Session) -> Result<(Session, bool)>;
	async fn get_session_by_key(&self, sesion_id: &str) -> Result<Option<Session>>;
	async fn find_session_for_visitor(
		&self,
		sesion_id: &str,
		visitante_id: &str,
	) -> Result<Option<Session>>;
	async fn relink_session_visitor(&self, session_pk: Uuid, visitante_pk: Uuid) -> Result<()>;
	/// Closes the session if it is still open. Returns `false` when the
	/// session was already closed (no state change).
	async fn close_session_if_open(&self, session_pk: Uuid, close: &SessionClose) -> Result<bool>;

	// Ingestion
	async fn insert_pageview(&self, pageview: &PageView) -> Result<()>;
	/// Atomic counter bump for one ingested pageview.
	async fn record_page_activity(&self, session_pk: Uuid, at: DateTime<Utc>) -> Result<()>;
	async fn insert_event(&self, event: &Event) -> Result<()>;

	// Aggregation (pure reads)
	async fn stats_summary(&self, filter: &StatsFilter) -> Result<StatsSummary>;
	async fn list_sessions(
		&self,
		filter: &StatsFilter,
		es_rebote: Option<bool>,
		limit: u32,
	) -> Result<Vec<SessionListing>>;
	async fn daily_pageviews(&self, since: DateTime<Utc>) -> Result<Vec<(String, u64)>>;
	async fn top_pages(&self, filter: &StatsFilter, limit: u32) -> Result<Vec<(String, u64)>>;
}

/// SQLite implementation of the analytics repository.
#[derive(Clone)]
pub struct SqliteAnalyticsRepository {
	pool: SqlitePool,
}

impl SqliteAnalyticsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| AnalyticsServerError::InvalidData(format!("invalid {field}: {e}")))
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
	value
		.parse()
		.map_err(|_| AnalyticsServerError::InvalidData(format!("invalid {field}")))
}

// Database row structs for mapping
#[derive(sqlx::FromRow)]
struct SignatureRow {
	id: String,
	hash: String,
	text: String,
	created_at: String,
}

impl TryFrom<SignatureRow> for ClientSignature {
	type Error = AnalyticsServerError;

	fn try_from(row: SignatureRow) -> Result<Self> {
		Ok(ClientSignature {
			id: parse_uuid(&row.id, "signature ID")?,
			hash: SignatureHash(row.hash),
			text: row.text,
			created_at: parse_datetime(&row.created_at, "created_at")?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct VisitorRow {
	id: String,
	visitante_id: String,
	primera_visita: String,
	ultima_visita: String,
	user_agent_id: Option<String>,
	ip: Option<String>,
	tipo_dispositivo: Option<String>,
	pais: Option<String>,
	ciudad: Option<String>,
}

impl TryFrom<VisitorRow> for Visitor {
	type Error = AnalyticsServerError;

	fn try_from(row: VisitorRow) -> Result<Self> {
		Ok(Visitor {
			id: parse_uuid(&row.id, "visitor ID")?,
			visitante_id: row.visitante_id,
			primera_visita: parse_datetime(&row.primera_visita, "primera_visita")?,
			ultima_visita: parse_datetime(&row.ultima_visita, "ultima_visita")?,
			user_agent_id: row
				.user_agent_id
				.map(|s| parse_uuid(&s, "user_agent ID"))
				.transpose()?,
			ip: row.ip,
			tipo_dispositivo: row.tipo_dispositivo,
			pais: row.pais,
			ciudad: row.ciudad,
		})
	}
}

#[derive(sqlx::FromRow)]
struct SessionRow {
	id: String,
	sesion_id: String,
	visitante_id: String,
	inicio: String,
	fin: Option<String>,
	duracion_segundos: Option<i64>,
	conteo_paginas: i64,
	es_rebote: i64,
	ultima_actividad: Option<String>,
}

impl TryFrom<SessionRow> for Session {
	type Error = AnalyticsServerError;

	fn try_from(row: SessionRow) -> Result<Self> {
		Ok(Session {
			id: parse_uuid(&row.id, "session ID")?,
			sesion_id: row.sesion_id,
			visitante_id: parse_uuid(&row.visitante_id, "visitor ID")?,
			inicio: parse_datetime(&row.inicio, "inicio")?,
			fin: row.fin.map(|s| parse_datetime(&s, "fin")).transpose()?,
			duracion_segundos: row.duracion_segundos,
			conteo_paginas: row.conteo_paginas,
			es_rebote: row.es_rebote != 0,
			ultima_actividad: row
				.ultima_actividad
				.map(|s| parse_datetime(&s, "ultima_actividad"))
				.transpose()?,
		})
	}
}

const SESSION_COLUMNS: &str = "id, sesion_id, visitante_id, inicio, fin, \
	 duracion_segundos, conteo_paginas, es_rebote, ultima_actividad";

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepository {
	#[instrument(skip(self, signature), fields(hash = %signature.hash))]
	async fn get_or_create_signature(&self, signature: &ClientSignature) -> Result<ClientSignature> {
		// Insert-or-ignore keyed on the unique hash; concurrent first-seen
		// calls converge on one winner.
		sqlx::query(
			r#"
			INSERT INTO analytics_user_agents (id, hash, text, created_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(hash) DO NOTHING
			"#,
		)
		.bind(signature.id.to_string())
		.bind(signature.hash.as_str())
		.bind(&signature.text)
		.bind(signature.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		let row = sqlx::query_as::<_, SignatureRow>(
			"SELECT id, hash, text, created_at FROM analytics_user_agents WHERE hash = ?",
		)
		.bind(signature.hash.as_str())
		.fetch_one(&self.pool)
		.await?;

		row.try_into()
	}

	#[instrument(skip(self, visitor), fields(visitante_id = %visitor.visitante_id))]
	async fn get_or_create_visitor(&self, visitor: &Visitor) -> Result<(Visitor, bool)> {
		let result = sqlx::query(
			r#"
			INSERT INTO analytics_visitantes (
				id, visitante_id, primera_visita, ultima_visita,
				user_agent_id, ip, tipo_dispositivo, pais, ciudad
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(visitante_id) DO NOTHING
			"#,
		)
		.bind(visitor.id.to_string())
		.bind(&visitor.visitante_id)
		.bind(visitor.primera_visita.to_rfc3339())
		.bind(visitor.ultima_visita.to_rfc3339())
		.bind(visitor.user_agent_id.map(|id| id.to_string()))
		.bind(&visitor.ip)
		.bind(&visitor.tipo_dispositivo)
		.bind(&visitor.pais)
		.bind(&visitor.ciudad)
		.execute(&self.pool)
		.await?;

		let created = result.rows_affected() > 0;

		if !created {
			// Existing visitor: bump last-seen only. The signature attached
			// at creation is never overwritten.
			sqlx::query(
				"UPDATE analytics_visitantes SET ultima_visita = ? WHERE visitante_id = ?",
			)
			.bind(Utc::now().to_rfc3339())
			.bind(&visitor.visitante_id)
			.execute(&self.pool)
			.await?;
		}

		let row = sqlx::query_as::<_, VisitorRow>(
			r#"
			SELECT id, visitante_id, primera_visita, ultima_visita,
				   user_agent_id, ip, tipo_dispositivo, pais, ciudad
			FROM analytics_visitantes
			WHERE visitante_id = ?
			"#,
		)
		.bind(&visitor.visitante_id)
		.fetch_one(&self.pool)
		.await?;

		Ok((row.try_into()?, created))
	}

	#[instrument(skip(self, session), fields(sesion_id = %session.sesion_id))]
	async fn get_or_create_session(&self, session: &Session) -> Result<(Session, bool)> {
		let result = sqlx::query(
			r#"
			INSERT INTO analytics_sesiones (
				id, sesion_id, visitante_id, inicio, fin,
				duracion_segundos, conteo_paginas, es_rebote, ultima_actividad
			)
			VALUES (?, ?, ?, ?, NULL, NULL, 0, 0, NULL)
			ON CONFLICT(sesion_id) DO NOTHING
			"#,
		)
		.bind(session.id.to_string())
		.bind(&session.sesion_id)
		.bind(session.visitante_id.to_string())
		.bind(session.inicio.to_rfc3339())
		.execute(&self.pool)
		.await?;

		let created = result.rows_affected() > 0;

		let row = sqlx::query_as::<_, SessionRow>(&format!(
			"SELECT {SESSION_COLUMNS} FROM analytics_sesiones WHERE sesion_id = ?"
		))
		.bind(&session.sesion_id)
		.fetch_one(&self.pool)
		.await?;

		Ok((row.try_into()?, created))
	}

	#[instrument(skip(self))]
	async fn get_session_by_key(&self, sesion_id: &str) -> Result<Option<Session>> {
		let row = sqlx::query_as::<_, SessionRow>(&format!(
			"SELECT {SESSION_COLUMNS} FROM analytics_sesiones WHERE sesion_id = ?"
		))
		.bind(sesion_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn find_session_for_visitor(
		&self,
		sesion_id: &str,
		visitante_id: &str,
	) -> Result<Option<Session>> {
		let row = sqlx::query_as::<_, SessionRow>(
			r#"
			SELECT s.id, s.sesion_id, s.visitante_id, s.inicio, s.fin,
				   s.duracion_segundos, s.conteo_paginas, s.es_rebote, s.ultima_actividad
			FROM analytics_sesiones s
			JOIN analytics_visitantes v ON v.id = s.visitante_id
			WHERE s.sesion_id = ? AND v.visitante_id = ?
			"#,
		)
		.bind(sesion_id)
		.bind(visitante_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn relink_session_visitor(&self, session_pk: Uuid, visitante_pk: Uuid) -> Result<()> {
		sqlx::query("UPDATE analytics_sesiones SET visitante_id = ? WHERE id = ?")
			.bind(visitante_pk.to_string())
			.bind(session_pk.to_string())
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	#[instrument(skip(self, close), fields(session_pk = %session_pk))]
	async fn close_session_if_open(&self, session_pk: Uuid, close: &SessionClose) -> Result<bool> {
		let result = sqlx::query(
			r#"
			UPDATE analytics_sesiones SET
				fin = ?,
				duracion_segundos = ?,
				es_rebote = ?
			WHERE id = ? AND fin IS NULL
			"#,
		)
		.bind(close.fin.to_rfc3339())
		.bind(close.duracion_segundos)
		.bind(if close.es_rebote { 1 } else { 0 })
		.bind(session_pk.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self, pageview), fields(ruta = %pageview.ruta))]
	async fn insert_pageview(&self, pageview: &PageView) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_pagina_vista (
				id, sesion_id, ruta, nombre_pagina, hora,
				tiempo_en_pagina, referencia, utm_data, user_agent_id
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(pageview.id.to_string())
		.bind(pageview.sesion_id.to_string())
		.bind(&pageview.ruta)
		.bind(&pageview.nombre_pagina)
		.bind(pageview.hora.to_rfc3339())
		.bind(pageview.tiempo_en_pagina)
		.bind(&pageview.referencia)
		.bind(serde_json::to_string(&pageview.utm_data)?)
		.bind(pageview.user_agent_id.map(|id| id.to_string()))
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(session_pk = %session_pk))]
	async fn record_page_activity(&self, session_pk: Uuid, at: DateTime<Utc>) -> Result<()> {
		// Single read-modify-write at the storage layer so concurrent batch
		// ingestion for the same session never loses an increment.
		sqlx::query(
			r#"
			UPDATE analytics_sesiones SET
				conteo_paginas = conteo_paginas + 1,
				ultima_actividad = ?
			WHERE id = ?
			"#,
		)
		.bind(at.to_rfc3339())
		.bind(session_pk.to_string())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, event), fields(tipo = %event.tipo, nombre = %event.nombre))]
	async fn insert_event(&self, event: &Event) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_eventos (
				id, sesion_id, visitante_id, tipo, nombre, ruta, hora, metadata
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(event.sesion_id.map(|id| id.to_string()))
		.bind(event.visitante_id.to_string())
		.bind(event.tipo.to_string())
		.bind(&event.nombre)
		.bind(&event.ruta)
		.bind(event.hora.to_rfc3339())
		.bind(serde_json::to_string(&event.metadata)?)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, filter))]
	async fn stats_summary(&self, filter: &StatsFilter) -> Result<StatsSummary> {
		let session_row: (i64, Option<i64>, i64, Option<f64>) = sqlx::query_as(
			r#"
			SELECT COUNT(*),
				   SUM(s.es_rebote),
				   COUNT(DISTINCT s.visitante_id),
				   AVG(s.duracion_segundos)
			FROM analytics_sesiones s
			JOIN analytics_visitantes v ON v.id = s.visitante_id
			WHERE (?1 IS NULL OR s.inicio >= ?1)
			  AND (?2 IS NULL OR s.inicio <= ?2)
			  AND (?3 IS NULL OR v.pais = ?3)
			  AND (?4 IS NULL OR v.tipo_dispositivo = ?4)
			"#,
		)
		.bind(filter.start_bound())
		.bind(filter.end_bound())
		.bind(&filter.pais)
		.bind(&filter.dispositivo)
		.fetch_one(&self.pool)
		.await?;

		let pageview_row: (i64, Option<f64>) = sqlx::query_as(
			r#"
			SELECT COUNT(*), AVG(p.tiempo_en_pagina)
			FROM analytics_pagina_vista p
			JOIN analytics_sesiones s ON s.id = p.sesion_id
			JOIN analytics_visitantes v ON v.id = s.visitante_id
			WHERE (?1 IS NULL OR p.hora >= ?1)
			  AND (?2 IS NULL OR p.hora <= ?2)
			  AND (?3 IS NULL OR v.pais = ?3)
			  AND (?4 IS NULL OR v.tipo_dispositivo = ?4)
			"#,
		)
		.bind(filter.start_bound())
		.bind(filter.end_bound())
		.bind(&filter.pais)
		.bind(&filter.dispositivo)
		.fetch_one(&self.pool)
		.await?;

		Ok(StatsSummary {
			total_sessions: session_row.0 as u64,
			bounced_sessions: session_row.1.unwrap_or(0) as u64,
			total_visitors: session_row.2 as u64,
			avg_session_seconds: session_row.3.unwrap_or(0.0),
			total_pageviews: pageview_row.0 as u64,
			avg_page_seconds: pageview_row.1.unwrap_or(0.0),
		})
	}

	#[instrument(skip(self, filter))]
	async fn list_sessions(
		&self,
		filter: &StatsFilter,
		es_rebote: Option<bool>,
		limit: u32,
	) -> Result<Vec<SessionListing>> {
		let rows: Vec<(String, String, String, Option<String>, Option<i64>, i64, i64)> =
			sqlx::query_as(
				r#"
				SELECT s.sesion_id, v.visitante_id, s.inicio, s.fin,
					   s.duracion_segundos, s.conteo_paginas, s.es_rebote
				FROM analytics_sesiones s
				JOIN analytics_visitantes v ON v.id = s.visitante_id
				WHERE (?1 IS NULL OR s.inicio >= ?1)
				  AND (?2 IS NULL OR s.inicio <= ?2)
				  AND (?3 IS NULL OR v.pais = ?3)
				  AND (?4 IS NULL OR s.es_rebote = ?4)
				ORDER BY s.inicio DESC
				LIMIT ?5
				"#,
			)
			.bind(filter.start_bound())
			.bind(filter.end_bound())
			.bind(&filter.pais)
			.bind(es_rebote.map(i64::from))
			.bind(limit as i64)
			.fetch_all(&self.pool)
			.await?;

		rows.into_iter()
			.map(
				|(sesion_id, visitante_id, inicio, fin, duracion_segundos, conteo, rebote)| {
					Ok(SessionListing {
						sesion_id,
						visitante_id,
						inicio: parse_datetime(&inicio, "inicio")?,
						fin: fin.map(|s| parse_datetime(&s, "fin")).transpose()?,
						duracion_segundos,
						conteo_paginas: conteo,
						es_rebote: rebote != 0,
					})
				},
			)
			.collect()
	}

	#[instrument(skip(self))]
	async fn daily_pageviews(&self, since: DateTime<Utc>) -> Result<Vec<(String, u64)>> {
		let rows: Vec<(String, i64)> = sqlx::query_as(
			r#"
			SELECT date(hora) AS dia, COUNT(*) AS views
			FROM analytics_pagina_vista
			WHERE hora >= ?
			GROUP BY dia
			ORDER BY dia ASC
			"#,
		)
		.bind(since.to_rfc3339())
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(|(d, n)| (d, n as u64)).collect())
	}

	#[instrument(skip(self, filter))]
	async fn top_pages(&self, filter: &StatsFilter, limit: u32) -> Result<Vec<(String, u64)>> {
		let rows: Vec<(String, i64)> = sqlx::query_as(
			r#"
			SELECT p.ruta, COUNT(*) AS views
			FROM analytics_pagina_vista p
			JOIN analytics_sesiones s ON s.id = p.sesion_id
			JOIN analytics_visitantes v ON v.id = s.visitante_id
			WHERE (?1 IS NULL OR p.hora >= ?1)
			  AND (?2 IS NULL OR p.hora <= ?2)
			  AND (?3 IS NULL OR v.pais = ?3)
			  AND (?4 IS NULL OR v.tipo_dispositivo = ?4)
			GROUP BY p.ruta
			ORDER BY views DESC
			LIMIT ?5
			"#,
		)
		.bind(filter.start_bound())
		.bind(filter.end_bound())
		.bind(&filter.pais)
		.bind(&filter.dispositivo)
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(|(r, n)| (r, n as u64)).collect())
	}
}

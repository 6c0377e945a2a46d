// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pool creation and schema migrations for the analytics tables.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::{AnalyticsServerError, Result};

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Errors
/// Returns `AnalyticsServerError::InvalidData` if the URL is invalid, or a
/// `Database` error if the connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| AnalyticsServerError::InvalidData(format!("invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the analytics tables and the indexes implied by the reporting
/// query patterns. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS analytics_user_agents (
			id TEXT PRIMARY KEY,
			hash TEXT NOT NULL UNIQUE,
			text TEXT NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS analytics_visitantes (
			id TEXT PRIMARY KEY,
			visitante_id TEXT NOT NULL UNIQUE,
			primera_visita TEXT NOT NULL,
			ultima_visita TEXT NOT NULL,
			user_agent_id TEXT REFERENCES analytics_user_agents(id),
			ip TEXT,
			tipo_dispositivo TEXT,
			pais TEXT,
			ciudad TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS analytics_sesiones (
			id TEXT PRIMARY KEY,
			sesion_id TEXT NOT NULL UNIQUE,
			visitante_id TEXT NOT NULL REFERENCES analytics_visitantes(id) ON DELETE CASCADE,
			inicio TEXT NOT NULL,
			fin TEXT,
			duracion_segundos INTEGER,
			conteo_paginas INTEGER NOT NULL DEFAULT 0,
			es_rebote INTEGER NOT NULL DEFAULT 0,
			ultima_actividad TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS analytics_pagina_vista (
			id TEXT PRIMARY KEY,
			sesion_id TEXT NOT NULL REFERENCES analytics_sesiones(id) ON DELETE CASCADE,
			ruta TEXT NOT NULL,
			nombre_pagina TEXT NOT NULL DEFAULT '',
			hora TEXT NOT NULL,
			tiempo_en_pagina INTEGER,
			referencia TEXT NOT NULL DEFAULT '',
			utm_data TEXT NOT NULL DEFAULT '{}',
			user_agent_id TEXT REFERENCES analytics_user_agents(id)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS analytics_eventos (
			id TEXT PRIMARY KEY,
			sesion_id TEXT REFERENCES analytics_sesiones(id) ON DELETE SET NULL,
			visitante_id TEXT NOT NULL REFERENCES analytics_visitantes(id) ON DELETE CASCADE,
			tipo TEXT NOT NULL,
			nombre TEXT NOT NULL,
			ruta TEXT NOT NULL DEFAULT '',
			hora TEXT NOT NULL,
			metadata TEXT NOT NULL DEFAULT '{}'
		)
		"#,
	)
	.execute(pool)
	.await?;

	for stmt in [
		"CREATE INDEX IF NOT EXISTS idx_sesiones_inicio ON analytics_sesiones(inicio)",
		"CREATE INDEX IF NOT EXISTS idx_sesiones_visitante_inicio ON analytics_sesiones(visitante_id, inicio)",
		"CREATE INDEX IF NOT EXISTS idx_pagina_vista_hora ON analytics_pagina_vista(hora)",
		"CREATE INDEX IF NOT EXISTS idx_pagina_vista_ruta ON analytics_pagina_vista(ruta)",
		"CREATE INDEX IF NOT EXISTS idx_pagina_vista_sesion ON analytics_pagina_vista(sesion_id)",
		"CREATE INDEX IF NOT EXISTS idx_eventos_tipo_hora ON analytics_eventos(tipo, hora)",
		"CREATE INDEX IF NOT EXISTS idx_eventos_visitante_hora ON analytics_eventos(visitante_id, hora)",
		"CREATE INDEX IF NOT EXISTS idx_visitantes_pais ON analytics_visitantes(pais)",
	] {
		sqlx::query(stmt).execute(pool).await?;
	}

	tracing::debug!("analytics migrations applied");
	Ok(())
}

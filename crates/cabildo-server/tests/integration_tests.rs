// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router-level integration tests: routing, auth gating, wire formats.

use axum::{
	body::Body,
	http::{header, Request, StatusCode},
	Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use cabildo_server::{
	config::{DatabaseConfig, HttpConfig, LoggingConfig, ServerConfig, StatsAuthConfig},
	create_app_state, create_router,
};
use cabildo_server_analytics::schema;

const ADMIN_TOKEN: &str = "test-admin-token";
const FUNCIONARIO_TOKEN: &str = "test-funcionario-token";
const CIUDADANO_TOKEN: &str = "test-ciudadano-token";

async fn test_app() -> (TempDir, Router) {
	let dir = TempDir::new().expect("tempdir");
	let url = format!("sqlite:{}", dir.path().join("analytics.db").display());
	let pool = schema::create_pool(&url).await.expect("pool");
	schema::run_migrations(&pool).await.expect("migrations");

	let config = ServerConfig {
		http: HttpConfig::default(),
		database: DatabaseConfig { url },
		logging: LoggingConfig::default(),
		stats_auth: StatsAuthConfig {
			admin_token: Some(ADMIN_TOKEN.to_string()),
			funcionario_token: Some(FUNCIONARIO_TOKEN.to_string()),
			ciudadano_token: Some(CIUDADANO_TOKEN.to_string()),
		},
	};

	let app = create_router(create_app_state(pool, &config));
	(dir, app)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("GET").uri(uri);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(get_with_token("/health", None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn session_start_is_public() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/sessions/start",
			serde_json::json!({"visitante_id": "v1", "sesion_id": "s1"}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
	let body = json_body(response).await;
	assert_eq!(body["sesion_id"], "s1");
	assert_eq!(body["created"], true);
}

#[tokio::test]
async fn session_start_accepts_legacy_visitor_id() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/sessions/start",
			serde_json::json!({"visitor_id": "v-legacy", "sesion_id": "s1"}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn pageview_batch_roundtrip() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/pageviews/batch",
			serde_json::json!({"items": [
				{"visitante_id": "v1", "sesion_id": "s1", "ruta": "/tramites"},
				{"visitante_id": "v1", "sesion_id": "s1", "ruta": "/pagos"}
			]}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
	let body = json_body(response).await;
	assert_eq!(body["created"], 2);
}

#[tokio::test]
async fn single_pageview_is_accepted() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/pageviews",
			serde_json::json!({"visitante_id": "v1", "sesion_id": "s1", "ruta": "/tramites"}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
	let body = json_body(response).await;
	assert_eq!(body["created"], 1);
}

#[tokio::test]
async fn single_event_is_accepted() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/events",
			serde_json::json!({"visitante_id": "v1", "tipo": "custom_event", "nombre": "boton_pagar"}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
	let body = json_body(response).await;
	assert_eq!(body["created"], 1);
}

#[tokio::test]
async fn stats_require_authorization() {
	let (_dir, app) = test_app().await;

	let response = app
		.clone()
		.oneshot(get_with_token("/api/v1/analitica/stats/summary", None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = app
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/summary",
			Some("not-a-configured-token"),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_forbidden_for_ciudadano() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/summary",
			Some(CIUDADANO_TOKEN),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	let body = json_body(response).await;
	assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn stats_accessible_to_admin_and_funcionario() {
	let (_dir, app) = test_app().await;

	for token in [ADMIN_TOKEN, FUNCIONARIO_TOKEN] {
		let response = app
			.clone()
			.oneshot(get_with_token(
				"/api/v1/analitica/stats/summary",
				Some(token),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = json_body(response).await;
		assert_eq!(body["total_sessions"], 0);
		assert_eq!(body["bounce_rate"], 0.0);
	}
}

#[tokio::test]
async fn daily_pageviews_returns_ascending_buckets() {
	let (_dir, app) = test_app().await;

	app.clone()
		.oneshot(post_json(
			"/api/v1/analitica/pageviews/batch",
			serde_json::json!({"items": [
				{"visitante_id": "v1", "sesion_id": "s1", "ruta": "/tramites"}
			]}),
		))
		.await
		.unwrap();

	let response = app
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/pageviews/daily?days=7",
			Some(ADMIN_TOKEN),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	let rows = body.as_array().unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0]["views"], 1);
}

#[tokio::test]
async fn session_list_is_role_gated_and_filters_bounces() {
	let (_dir, app) = test_app().await;

	for (sesion, rutas) in [("s1", vec!["/tramites"]), ("s2", vec!["/tramites", "/pagos"])] {
		let items: Vec<serde_json::Value> = rutas
			.iter()
			.map(|ruta| serde_json::json!({"visitante_id": "v1", "sesion_id": sesion, "ruta": ruta}))
			.collect();
		app.clone()
			.oneshot(post_json(
				"/api/v1/analitica/pageviews/batch",
				serde_json::json!({ "items": items }),
			))
			.await
			.unwrap();
		app.clone()
			.oneshot(post_json(
				"/api/v1/analitica/sessions/end",
				serde_json::json!({"visitante_id": "v1", "sesion_id": sesion}),
			))
			.await
			.unwrap();
	}

	let response = app
		.clone()
		.oneshot(get_with_token("/api/v1/analitica/stats/sessions", None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = app
		.clone()
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/sessions",
			Some(ADMIN_TOKEN),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body.as_array().unwrap().len(), 2);

	let response = app
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/sessions?es_rebote=true",
			Some(ADMIN_TOKEN),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	let rows = body.as_array().unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0]["sesion_id"], "s1");
	assert_eq!(rows[0]["es_rebote"], true);
	assert_eq!(rows[0]["conteo_paginas"], 1);
}

#[tokio::test]
async fn pdf_report_is_role_gated_download() {
	let (_dir, app) = test_app().await;

	let response = app
		.clone()
		.oneshot(get_with_token("/api/v1/analitica/stats/report/pdf", None))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = app
		.oneshot(get_with_token(
			"/api/v1/analitica/stats/report/pdf",
			Some(ADMIN_TOKEN),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get(header::CONTENT_TYPE).unwrap(),
		"application/pdf"
	);

	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	assert!(bytes.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn invalid_batch_is_rejected() {
	let (_dir, app) = test_app().await;

	let response = app
		.oneshot(post_json(
			"/api/v1/analitica/events/batch",
			serde_json::json!({"items": [
				{"visitante_id": "v1", "tipo": "clic", "nombre": "boton"}
			]}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let body = json_body(response).await;
	assert_eq!(body["error"], "invalid_tipo");
}

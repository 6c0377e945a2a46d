// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Web-analytics server implementation for Cabildo.
//!
//! This crate provides the server-side implementation of the analytics
//! subsystem: session lifecycle management, page-view and event ingestion,
//! aggregation queries, and the PDF report renderer.
//!
//! # Architecture
//!
//! - `repository` - Database operations for signatures, visitors, sessions,
//!   pageviews and events
//! - `schema` - Pool creation and schema migrations
//! - `handlers` - Transport-agnostic handler implementations, generic over
//!   the repository
//! - `auth` - Role-gated access for the reporting endpoints
//! - `report` - Minimal single-page PDF rendering
//!
//! # Example
//!
//! ```ignore
//! use cabildo_server_analytics::{schema, AnalyticsState, SqliteAnalyticsRepository};
//!
//! let pool = schema::create_pool("sqlite:./cabildo.db").await?;
//! schema::run_migrations(&pool).await?;
//! let state = AnalyticsState::new(SqliteAnalyticsRepository::new(pool));
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod report;
pub mod repository;
pub mod schema;

pub use auth::{extract_bearer_token, Role, StatsAuthContext, StatsAuthError};
pub use error::{AnalyticsServerError, Result};
pub use handlers::capture::{
	batch_events_impl, batch_pageviews_impl, create_event_impl, create_pageview_impl,
};
pub use handlers::sessions::{end_session_impl, start_session_impl};
pub use handlers::stats::{
	daily_pageviews_impl, list_sessions_impl, report_pdf_impl, stats_summary_impl,
	top_pages_impl,
};
pub use handlers::AnalyticsState;
pub use repository::{
	AnalyticsRepository, SessionListing, SqliteAnalyticsRepository, StatsFilter, StatsSummary,
};

// Re-export core types for convenience
pub use cabildo_analytics_core::*;

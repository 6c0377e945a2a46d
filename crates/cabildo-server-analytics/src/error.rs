// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics server.

use thiserror::Error;

/// Errors that can occur in the analytics server.
#[derive(Debug, Error)]
pub enum AnalyticsServerError {
	/// Database error
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	/// Invalid stored data
	#[error("invalid analytics data: {0}")]
	InvalidData(String),

	/// JSON serialization error
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Core error
	#[error("analytics core error: {0}")]
	Core(#[from] cabildo_analytics_core::AnalyticsError),
}

/// Result type for analytics server operations.
pub type Result<T> = std::result::Result<T, AnalyticsServerError>;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for analytics core.

use thiserror::Error;

/// Errors that can occur in analytics core operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// Unknown event type tag
	#[error("invalid event type: {0}")]
	InvalidEventType(String),

	/// Invalid domain data
	#[error("invalid analytics data: {0}")]
	InvalidData(String),
}

/// Result type for analytics core operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod capture;
pub mod sessions;
pub mod stats;

/// Shared state for the analytics handlers.
pub struct AnalyticsState<R: crate::repository::AnalyticsRepository> {
	pub repository: R,
}

impl<R: crate::repository::AnalyticsRepository> AnalyticsState<R> {
	pub fn new(repository: R) -> Self {
		Self { repository }
	}
}

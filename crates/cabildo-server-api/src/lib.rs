// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod analytics;

pub use analytics::{
	AnalyticsErrorResponse, BatchCreatedResponse, DailyPageviewsQuery, DailyPageviewsRow,
	EventBatchRequest, EventItemRequest, PageViewBatchRequest, PageViewItemRequest,
	ReportPdfQuery, SessionEndRequest, SessionEndResponse, SessionListQuery, SessionListRow,
	SessionStartRequest, SessionStartResponse, StatsSummaryQuery, StatsSummaryResponse,
	TopPagesQuery, TopPagesRow,
};

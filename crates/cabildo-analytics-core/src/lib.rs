// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Cabildo web analytics.
//!
//! This crate defines the domain model for the analytics ingestion pipeline:
//! deduplicated user-agent signatures, visitors, browsing sessions with their
//! close-of-session derivations (duration and bounce), pageviews, and typed
//! events. It contains no I/O; persistence lives in
//! `cabildo-server-analytics`.

pub mod error;
pub mod event;
pub mod pageview;
pub mod session;
pub mod signature;
pub mod visitor;

pub use error::{AnalyticsError, Result};
pub use event::{Event, EventType};
pub use pageview::PageView;
pub use session::{Session, SessionClose};
pub use signature::{ClientSignature, SignatureHash};
pub use visitor::Visitor;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for the Cabildo web-analytics subsystem.
//!
//! Wires the transport-agnostic handler implementations from
//! `cabildo-server-analytics` into an axum router, adds role-gated access to
//! the reporting endpoints, and serves the OpenAPI documentation.

pub mod api;
pub mod auth_middleware;
pub mod config;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use config::{load_config, ConfigError, ServerConfig};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deduplicated user-agent signatures.
//!
//! Raw user-agent strings are stored once, keyed by a deterministic content
//! hash. Concurrent first-seen inserts converge on one row because the hash
//! column carries a unique constraint; no application-level locking is
//! involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Deterministic content hash of a raw user-agent string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignatureHash(pub String);

impl SignatureHash {
	/// Computes the SHA-256 hex digest of the raw string.
	#[must_use]
	pub fn of(text: &str) -> Self {
		let digest = Sha256::digest(text.as_bytes());
		Self(format!("{digest:x}"))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for SignatureHash {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A deduplicated user-agent record. The `text` column keeps the first-seen
/// value; rows are immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientSignature {
	pub id: Uuid,
	pub hash: SignatureHash,
	pub text: String,
	pub created_at: DateTime<Utc>,
}

impl ClientSignature {
	/// Builds a signature candidate from a raw agent string.
	///
	/// Empty input yields `None`: callers proceed without a signature, it is
	/// not an error.
	#[must_use]
	pub fn from_raw(text: &str) -> Option<Self> {
		if text.is_empty() {
			return None;
		}
		Some(Self {
			id: Uuid::now_v7(),
			hash: SignatureHash::of(text),
			text: text.to_string(),
			created_at: Utc::now(),
		})
	}
}

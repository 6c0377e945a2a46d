// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment-driven configuration (`CABILDO_SERVER_*`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid value for {variable}: {message}")]
	Invalid {
		variable: &'static str,
		message: String,
	},
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub stats_auth: StatsAuthConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8080,
		}
	}
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:cabildo-analytics.db".to_string(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Bearer tokens mapped to roles. Unset tokens disable the role. The
/// ciudadano token authenticates but carries no reporting capability.
#[derive(Debug, Clone, Default)]
pub struct StatsAuthConfig {
	pub admin_token: Option<String>,
	pub funcionario_token: Option<String>,
	pub ciudadano_token: Option<String>,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

fn env_nonempty(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Load configuration from `CABILDO_SERVER_*` environment variables, falling
/// back to defaults for anything unset.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let mut http = HttpConfig::default();
	if let Some(host) = env_nonempty("CABILDO_SERVER_HOST") {
		http.host = host;
	}
	if let Some(port) = env_nonempty("CABILDO_SERVER_PORT") {
		http.port = port.parse().map_err(|e| ConfigError::Invalid {
			variable: "CABILDO_SERVER_PORT",
			message: format!("{e}"),
		})?;
	}

	let mut database = DatabaseConfig::default();
	if let Some(url) = env_nonempty("CABILDO_SERVER_DATABASE_URL") {
		database.url = url;
	}

	let mut logging = LoggingConfig::default();
	if let Some(level) = env_nonempty("CABILDO_SERVER_LOG_LEVEL") {
		logging.level = level;
	}

	let stats_auth = StatsAuthConfig {
		admin_token: env_nonempty("CABILDO_SERVER_ADMIN_TOKEN"),
		funcionario_token: env_nonempty("CABILDO_SERVER_FUNCIONARIO_TOKEN"),
		ciudadano_token: env_nonempty("CABILDO_SERVER_CIUDADANO_TOKEN"),
	};

	Ok(ServerConfig {
		http,
		database,
		logging,
		stats_auth,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_bind_localhost() {
		let http = HttpConfig::default();
		assert_eq!(http.host, "127.0.0.1");
		assert_eq!(http.port, 8080);
	}

	#[test]
	fn socket_addr_formats_host_and_port() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "0.0.0.0".to_string(),
				port: 9000,
			},
			database: DatabaseConfig::default(),
			logging: LoggingConfig::default(),
			stats_auth: StatsAuthConfig::default(),
		};
		assert_eq!(config.socket_addr(), "0.0.0.0:9000");
	}

	#[test]
	fn unset_tokens_disable_reporting_roles() {
		let auth = StatsAuthConfig::default();
		assert!(auth.admin_token.is_none());
		assert!(auth.funcionario_token.is_none());
		assert!(auth.ciudadano_token.is_none());
	}
}

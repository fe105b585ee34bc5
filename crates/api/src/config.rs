//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use staffroom_core::paging::MAX_PAGE_SIZE;
use staffroom_infra::SessionScope;
use staffroom_observability::LogFormat;

pub const BIND_ADDR_VAR: &str = "STAFFROOM_BIND_ADDR";
pub const SESSION_SCOPE_VAR: &str = "STAFFROOM_SESSION_SCOPE";
pub const PAGE_SIZE_VAR: &str = "STAFFROOM_PAGE_SIZE";
pub const LOG_FORMAT_VAR: &str = "STAFFROOM_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub session_scope: SessionScope,
    pub default_page_size: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_scope: SessionScope::Request,
            default_page_size: 20,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Log format alone, so tracing can be installed before the rest is read.
    pub fn log_format_from_env() -> LogFormat {
        std::env::var(LOG_FORMAT_VAR)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_page_size = parse_or(&lookup, PAGE_SIZE_VAR, defaults.default_page_size);
        let default_page_size = if default_page_size == 0 || default_page_size > MAX_PAGE_SIZE {
            tracing::warn!(
                var = PAGE_SIZE_VAR,
                value = default_page_size,
                "page size out of range; using default"
            );
            defaults.default_page_size
        } else {
            default_page_size
        };

        Self {
            bind_addr: parse_or(&lookup, BIND_ADDR_VAR, defaults.bind_addr),
            session_scope: parse_or(&lookup, SESSION_SCOPE_VAR, defaults.session_scope),
            default_page_size,
            log_format: parse_or(&lookup, LOG_FORMAT_VAR, defaults.log_format),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(var = key, value = %raw, error = %err, "invalid configuration value; using default");
                default
            }
        },
    }
}

//! Typed configuration accepted by the core.
//!
//! The core does not load configuration files itself (that's the embedding
//! application's job); it only defines the recognized shape and validates
//! it, per the Design Note in spec §9: "the core must reject unknown keys
//! rather than silently accept them."

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;

/// Recognized configuration keys (spec §6).
const RECOGNIZED_KEYS: &[&str] = &[
    "db_url",
    "db_name",
    "db_user",
    "db_password",
    "db_port",
    "max_active_transactions",
    "max_pool_transactions",
    "max_overview_rows",
    "max_generative_depth",
    "max_tuple_per_query",
];

/// Typed, validated configuration for the core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub db_url: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_port: u16,
    pub max_active_transactions: usize,
    pub max_pool_transactions: usize,
    pub max_overview_rows: i64,
    pub max_generative_depth: u32,
    pub max_tuple_per_query: usize,
}

impl CoreConfig {
    /// Build a [`CoreConfig`] from a string-keyed map (e.g. parsed from an
    /// external config file/env by the embedding application).
    ///
    /// Rejects any key not in [`RECOGNIZED_KEYS`] with `CoreError::BadRequest`,
    /// rather than silently ignoring it.
    pub fn from_map(map: &HashMap<String, String>) -> CoreResult<Self> {
        for key in map.keys() {
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                return Err(CoreError::bad_request(format!(
                    "unknown configuration key: {key}"
                )));
            }
        }

        let get = |key: &str| -> CoreResult<&str> {
            map.get(key)
                .map(String::as_str)
                .ok_or_else(|| CoreError::bad_request(format!("missing configuration key: {key}")))
        };
        let parse_num = |key: &str| -> CoreResult<i64> {
            get(key)?
                .parse::<i64>()
                .map_err(|e| CoreError::bad_request(format!("invalid value for {key}: {e}")))
        };

        Ok(Self {
            db_url: get("db_url")?.to_string(),
            db_name: get("db_name")?.to_string(),
            db_user: get("db_user")?.to_string(),
            db_password: get("db_password")?.to_string(),
            db_port: parse_num("db_port")? as u16,
            max_active_transactions: parse_num("max_active_transactions")? as usize,
            max_pool_transactions: parse_num("max_pool_transactions")? as usize,
            max_overview_rows: parse_num("max_overview_rows")?,
            max_generative_depth: parse_num("max_generative_depth")? as u32,
            max_tuple_per_query: parse_num("max_tuple_per_query")? as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_map() -> HashMap<String, String> {
        [
            ("db_url", "localhost"),
            ("db_name", "pubviewer"),
            ("db_user", "pv"),
            ("db_password", "secret"),
            ("db_port", "5432"),
            ("max_active_transactions", "8"),
            ("max_pool_transactions", "16"),
            ("max_overview_rows", "100"),
            ("max_generative_depth", "5"),
            ("max_tuple_per_query", "500"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn accepts_full_recognized_map() {
        let cfg = CoreConfig::from_map(&valid_map()).unwrap();
        assert_eq!(cfg.db_port, 5432);
        assert_eq!(cfg.max_generative_depth, 5);
    }

    #[test]
    fn rejects_unknown_key() {
        let mut map = valid_map();
        map.insert("db_ssl_mode".to_string(), "require".to_string());
        let err = CoreConfig::from_map(&map).unwrap_err();
        assert!(matches!(err, CoreError::BadRequest(_)));
    }

    #[test]
    fn rejects_missing_key() {
        let mut map = valid_map();
        map.remove("db_port");
        assert!(CoreConfig::from_map(&map).is_err());
    }
}

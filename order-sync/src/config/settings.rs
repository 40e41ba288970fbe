//! Environment-driven settings.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use order_sync_pipeline::BatchPolicy;

use crate::SyncError;

const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";
const DEFAULT_CHANGE_TOPIC: &str = "orderID-created-v01";
const DEFAULT_DOCUMENT_TOPIC: &str = "orderDuplicate-created-v01";
const DEFAULT_RELAY_GROUP_ID: &str = "order-change-relay";
const DEFAULT_INDEXER_GROUP_ID: &str = "order-index-writer";
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";
const DEFAULT_ORDER_INDEX: &str = "order_duplicate_v01";
const DEFAULT_ORDER_API_URL: &str = "http://localhost:8011/api/orders";
const DEFAULT_ORDER_LOOKUP_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_SEARCH_API_ADDR: &str = "0.0.0.0:8013";

const DEFAULT_BATCH_INTERVAL_MS: u64 = 1_000;
const DEFAULT_POLL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_MESSAGES: usize = 2;
const DEFAULT_MAX_TIMEOUTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Everything the process reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub kafka_broker: String,
    pub change_topic: String,
    pub document_topic: String,
    pub relay_group_id: String,
    pub indexer_group_id: String,
    pub relay_batch: BatchPolicy,
    pub indexer_batch: BatchPolicy,
    pub opensearch_url: String,
    pub order_index: String,
    pub order_api_url: String,
    pub order_lookup_timeout: Duration,
    pub search_api_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `CHANGE_TOPIC` / `DOCUMENT_TOPIC`: relay input and output topics
    /// - `RELAY_GROUP_ID` / `INDEXER_GROUP_ID`: consumer groups
    /// - `{RELAY,INDEXER}_BATCH_INTERVAL_MS`, `_POLL_TIMEOUT_MS`,
    ///   `_MAX_MESSAGES`, `_MAX_TIMEOUTS`: batch read policy per loop
    /// - `OPENSEARCH_URL`, `ORDER_INDEX`: search index location
    /// - `ORDER_API_URL`, `ORDER_LOOKUP_TIMEOUT_MS`: order service
    /// - `SEARCH_API_ADDR`: listen address of the search endpoints
    /// - `LOG_FORMAT`: `json` for JSON lines, anything else for text
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let search_api_addr = text("SEARCH_API_ADDR", DEFAULT_SEARCH_API_ADDR);
        let search_api_addr = search_api_addr
            .parse::<SocketAddr>()
            .map_err(|e| SyncError::config(format!("SEARCH_API_ADDR '{}': {}", search_api_addr, e)))?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            kafka_broker: text("KAFKA_BROKER", DEFAULT_KAFKA_BROKER),
            change_topic: text("CHANGE_TOPIC", DEFAULT_CHANGE_TOPIC),
            document_topic: text("DOCUMENT_TOPIC", DEFAULT_DOCUMENT_TOPIC),
            relay_group_id: text("RELAY_GROUP_ID", DEFAULT_RELAY_GROUP_ID),
            indexer_group_id: text("INDEXER_GROUP_ID", DEFAULT_INDEXER_GROUP_ID),
            relay_batch: batch_policy(&lookup, "RELAY")?,
            indexer_batch: batch_policy(&lookup, "INDEXER")?,
            opensearch_url: text("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            order_index: text("ORDER_INDEX", DEFAULT_ORDER_INDEX),
            order_api_url: text("ORDER_API_URL", DEFAULT_ORDER_API_URL),
            order_lookup_timeout: Duration::from_millis(number(
                &lookup,
                "ORDER_LOOKUP_TIMEOUT_MS",
                DEFAULT_ORDER_LOOKUP_TIMEOUT_MS,
            )?),
            search_api_addr,
            log_format,
        })
    }
}

fn number<F, T>(lookup: &F, name: &str, default: T) -> Result<T, SyncError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SyncError::config(format!("{} '{}': {}", name, raw, e))),
    }
}

fn batch_policy<F>(lookup: &F, prefix: &str) -> Result<BatchPolicy, SyncError>
where
    F: Fn(&str) -> Option<String>,
{
    let policy = BatchPolicy {
        batch_interval: Duration::from_millis(number(
            lookup,
            &format!("{}_BATCH_INTERVAL_MS", prefix),
            DEFAULT_BATCH_INTERVAL_MS,
        )?),
        poll_timeout: Duration::from_millis(number(
            lookup,
            &format!("{}_POLL_TIMEOUT_MS", prefix),
            DEFAULT_POLL_TIMEOUT_MS,
        )?),
        max_messages: number(lookup, &format!("{}_MAX_MESSAGES", prefix), DEFAULT_MAX_MESSAGES)?,
        max_timeouts: number(lookup, &format!("{}_MAX_TIMEOUTS", prefix), DEFAULT_MAX_TIMEOUTS)?,
    };

    policy
        .validate()
        .map_err(|e| SyncError::config(format!("{} batch policy: {}", prefix, e)))?;
    Ok(policy)
}

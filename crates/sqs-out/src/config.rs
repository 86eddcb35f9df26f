// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Queue configuration and the validation rules applied before any traffic.
//!
//! Options use the plugin key names below. [`SqsOutConfig::from_env`] reads
//! them from environment variables instead:
//!
//! | Key                   | Environment variable          | Required            |
//! |-----------------------|-------------------------------|---------------------|
//! | `QueueUrl`            | `SQS_QUEUE_URL`               | yes                 |
//! | `QueueRegion`         | `SQS_QUEUE_REGION`            | yes                 |
//! | `QueueMessageGroupId` | `SQS_QUEUE_MESSAGE_GROUP_ID`  | for `.fifo` queues  |
//! | `BatchSize`           | `SQS_BATCH_SIZE`              | yes, 1 through 10   |
//! | `PluginTagAttribute`  | `SQS_PLUGIN_TAG_ATTRIBUTE`    | no                  |
//! | `ProxyUrl`            | `SQS_PROXY_URL`/`HTTPS_PROXY` | no                  |
//! | `EndpointUrl`         | `SQS_ENDPOINT_URL`            | no                  |
//! | `TimeoutSecs`         | `SQS_TIMEOUT_SECS`            | no, default 10      |
//! | `LogLevel`            | `SQS_OUT_LOG_LEVEL`           | no, default `info`  |

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::errors::ConfigError;
use crate::logger::LogLevel;

pub const KEY_QUEUE_URL: &str = "QueueUrl";
pub const KEY_QUEUE_REGION: &str = "QueueRegion";
pub const KEY_MESSAGE_GROUP_ID: &str = "QueueMessageGroupId";
pub const KEY_TAG_ATTRIBUTE: &str = "PluginTagAttribute";
pub const KEY_PROXY_URL: &str = "ProxyUrl";
pub const KEY_BATCH_SIZE: &str = "BatchSize";
pub const KEY_ENDPOINT_URL: &str = "EndpointUrl";
pub const KEY_TIMEOUT_SECS: &str = "TimeoutSecs";
pub const KEY_LOG_LEVEL: &str = "LogLevel";

/// Queue names ending in this suffix are FIFO queues.
pub const FIFO_SUFFIX: &str = ".fifo";

/// SendMessageBatch accepts at most ten entries.
pub const MAX_BATCH_SIZE: usize = 10;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_VARS: [(&str, &str); 9] = [
    (KEY_QUEUE_URL, "SQS_QUEUE_URL"),
    (KEY_QUEUE_REGION, "SQS_QUEUE_REGION"),
    (KEY_MESSAGE_GROUP_ID, "SQS_QUEUE_MESSAGE_GROUP_ID"),
    (KEY_TAG_ATTRIBUTE, "SQS_PLUGIN_TAG_ATTRIBUTE"),
    (KEY_PROXY_URL, "SQS_PROXY_URL"),
    (KEY_BATCH_SIZE, "SQS_BATCH_SIZE"),
    (KEY_ENDPOINT_URL, "SQS_ENDPOINT_URL"),
    (KEY_TIMEOUT_SECS, "SQS_TIMEOUT_SECS"),
    (KEY_LOG_LEVEL, "SQS_OUT_LOG_LEVEL"),
];

/// Delivery addressing mode of the target queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueMode {
    Standard,
    /// Ordered delivery; every message needs a group id.
    Fifo,
}

impl QueueMode {
    /// Derives the mode from the queue address: a queue name ending in
    /// [`FIFO_SUFFIX`] is ordered, anything else is standard. A trailing slash
    /// on the URL is ignored.
    #[must_use]
    pub fn from_queue_url(queue_url: &str) -> Self {
        if queue_url.trim_end_matches('/').ends_with(FIFO_SUFFIX) {
            QueueMode::Fifo
        } else {
            QueueMode::Standard
        }
    }
}

/// Checks the queue address, region and group id against the addressing mode.
///
/// Pure: the same inputs always give the same answer.
///
/// # Errors
///
/// [`ConfigError::MissingQueueUrl`], [`ConfigError::MissingQueueRegion`], or
/// [`ConfigError::MissingGroupId`] when a FIFO queue has no group id.
pub fn validate_queue_config(
    queue_url: &str,
    region: &str,
    message_group_id: &str,
) -> Result<QueueMode, ConfigError> {
    if queue_url.is_empty() {
        return Err(ConfigError::MissingQueueUrl);
    }
    if region.is_empty() {
        return Err(ConfigError::MissingQueueRegion);
    }

    let mode = QueueMode::from_queue_url(queue_url);
    if mode == QueueMode::Fifo && message_group_id.is_empty() {
        return Err(ConfigError::MissingGroupId);
    }
    Ok(mode)
}

/// Parses a batch size, accepting only the integers 1 through 10.
///
/// # Errors
///
/// [`ConfigError::InvalidBatchSize`] for anything else: non-numeric text,
/// fractions, zero, negatives or values above 10.
pub fn parse_batch_size(value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(size) if (1..=MAX_BATCH_SIZE).contains(&size) => Ok(size),
        _ => Err(ConfigError::InvalidBatchSize(value.to_string())),
    }
}

#[must_use]
pub fn validate_batch_size(value: &str) -> bool {
    parse_batch_size(value).is_ok()
}

/// Validated output configuration, read-only for the lifetime of the process.
///
/// The addressing mode is not stored: it is always derived from `queue_url`
/// so the two cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct SqsOutConfig {
    pub queue_url: String,
    pub region: String,
    /// Present (and only used) for FIFO queues.
    pub message_group_id: Option<String>,
    /// Name of the message attribute that carries the record tag, if any.
    pub tag_attribute: Option<String>,
    pub batch_size: usize,
    pub proxy_url: Option<String>,
    /// Overrides the regional SQS endpoint.
    pub endpoint_url: Option<String>,
    pub timeout: Duration,
    pub log_level: LogLevel,
}

impl SqsOutConfig {
    /// Minimal configuration for a queue; optional settings take their defaults.
    ///
    /// # Errors
    ///
    /// Any error of [`SqsOutConfig::validate`].
    pub fn new(queue_url: &str, region: &str, batch_size: usize) -> Result<Self, ConfigError> {
        let config = Self {
            queue_url: queue_url.to_string(),
            region: region.to_string(),
            message_group_id: None,
            tag_attribute: None,
            batch_size,
            proxy_url: None,
            endpoint_url: None,
            timeout: DEFAULT_TIMEOUT,
            log_level: LogLevel::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from plugin-style keys. Values are trimmed and
    /// blank values count as absent.
    ///
    /// # Errors
    ///
    /// The first configuration rule that fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let queue_url = get(KEY_QUEUE_URL).unwrap_or_default();
        let region = get(KEY_QUEUE_REGION).unwrap_or_default();
        let message_group_id = get(KEY_MESSAGE_GROUP_ID);
        let mode = validate_queue_config(
            &queue_url,
            &region,
            message_group_id.as_deref().unwrap_or_default(),
        )?;

        let batch_size = parse_batch_size(&get(KEY_BATCH_SIZE).unwrap_or_default())?;

        let timeout = match get(KEY_TIMEOUT_SECS) {
            Some(secs) => match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(secs)),
            },
            None => DEFAULT_TIMEOUT,
        };

        let config = Self {
            queue_url,
            region,
            message_group_id: message_group_id.filter(|_| mode == QueueMode::Fifo),
            tag_attribute: get(KEY_TAG_ATTRIBUTE),
            batch_size,
            proxy_url: get(KEY_PROXY_URL),
            endpoint_url: get(KEY_ENDPOINT_URL),
            timeout,
            log_level: LogLevel::from_setting(&get(KEY_LOG_LEVEL).unwrap_or_default()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from `SQS_*` environment variables.
    ///
    /// # Errors
    ///
    /// The first configuration rule that fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            let from_var = ENV_VARS
                .iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, var)| env::var(var).ok());
            if from_var.is_none() && key == KEY_PROXY_URL {
                return env::var("HTTPS_PROXY").ok();
            }
            from_var
        })
    }

    /// Re-checks every rule; used for configurations assembled by hand.
    ///
    /// # Errors
    ///
    /// The first configuration rule that fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_queue_config(
            &self.queue_url,
            &self.region,
            self.message_group_id.as_deref().unwrap_or_default(),
        )?;

        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConfigError::InvalidBatchSize(self.batch_size.to_string()));
        }

        if let Some(proxy) = &self.proxy_url {
            Url::parse(proxy).map_err(|e| ConfigError::InvalidProxyUrl(format!("{proxy}: {e}")))?;
        }

        if let Some(endpoint) = &self.endpoint_url {
            let url = Url::parse(endpoint)
                .map_err(|e| ConfigError::InvalidEndpointUrl(format!("{endpoint}: {e}")))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidEndpointUrl(endpoint.clone()));
            }
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn mode(&self) -> QueueMode {
        QueueMode::from_queue_url(&self.queue_url)
    }

    #[must_use]
    pub fn is_fifo(&self) -> bool {
        self.mode() == QueueMode::Fifo
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://sqs.{}.amazonaws.com", self.region),
        }
    }
}

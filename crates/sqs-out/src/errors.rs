// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for configuration, record encoding and batch dispatch.

/// Configuration rejected at startup; no records are accepted after one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("QueueUrl is required")]
    MissingQueueUrl,

    #[error("QueueRegion is required")]
    MissingQueueRegion,

    #[error("QueueMessageGroupId is required for FIFO queues")]
    MissingGroupId,

    #[error("BatchSize must be an integer between 1 and 10, got '{0}'")]
    InvalidBatchSize(String),

    #[error("ProxyUrl is not a valid URL: {0}")]
    InvalidProxyUrl(String),

    #[error("EndpointUrl is not a valid URL: {0}")]
    InvalidEndpointUrl(String),

    #[error("TimeoutSecs must be a positive integer, got '{0}'")]
    InvalidTimeout(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("No AWS credentials provider is available")]
    MissingCredentials,
}

/// A single record could not be turned into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("field '{field}' holds a value that cannot be represented in JSON")]
    UnrepresentableValue { field: String },

    #[error("failed to encode record: {0}")]
    Json(String),
}

/// The batch-send request failed as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to resolve AWS credentials: {0}")]
    Credentials(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("error sending batch to SQS: {0}")]
    Transport(String),

    #[error("SQS rejected the batch ({status}): {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected response from SQS: {0}")]
    InvalidResponse(String),
}

/// Top-level error returned by the ingestion handle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

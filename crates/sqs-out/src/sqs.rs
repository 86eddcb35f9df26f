// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the SQS `SendMessageBatch` action.
//!
//! [`QueueClient`] is the narrow capability the flusher depends on, so tests
//! can substitute an in-memory implementation. [`SqsClient`] is the real one:
//! it speaks the SQS JSON protocol over reqwest and signs each request with
//! SigV4 using credentials from the standard AWS provider chain.

use std::collections::BTreeMap;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::SqsOutConfig;
use crate::errors::{ConfigError, DispatchError};
use crate::http::get_client;

const SIGNING_NAME: &str = "sqs";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const SEND_MESSAGE_BATCH_TARGET: &str = "AmazonSQS.SendMessageBatch";
const QUERY_ERROR_HEADER: &str = "x-amzn-query-error";

/// A typed message attribute; only `String` attributes are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: String,
}

impl MessageAttribute {
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: value.to_string(),
        }
    }
}

/// One message of a `SendMessageBatch` request.
///
/// `message_group_id` is set only for FIFO queues and the attribute map only
/// when a tag attribute is configured; both are left out of the JSON otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchEntry {
    /// Identifier unique within the request.
    pub id: String,
    pub message_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub message_attributes: BTreeMap<String, MessageAttribute>,
}

/// Body of a `SendMessageBatch` call: the target queue and up to ten entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendBatchRequest {
    pub queue_url: String,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SucceededEntry {
    pub id: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailedEntry {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sender_fault: bool,
}

/// Per-message result of a completed batch send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendBatchOutput {
    #[serde(default)]
    pub successful: Vec<SucceededEntry>,
    #[serde(default)]
    pub failed: Vec<FailedEntry>,
}

impl SendBatchOutput {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Sends one batch. `Ok` means the service answered, even if it rejected
    /// some entries; `Err` means the request as a whole failed.
    async fn send_batch(&self, request: &SendBatchRequest) -> Result<SendBatchOutput, DispatchError>;
}

/// SQS client over the JSON protocol.
#[derive(Debug, Clone)]
pub struct SqsClient {
    client: reqwest::Client,
    endpoint: String,
    region: String,
    credentials: SharedCredentialsProvider,
}

impl SqsClient {
    /// Creates a client with explicit credentials.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built from the configuration.
    pub fn new(
        config: &SqsOutConfig,
        credentials: SharedCredentialsProvider,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: get_client(config)?,
            endpoint: config.endpoint(),
            region: config.region.clone(),
            credentials,
        })
    }

    /// Creates a client using the default AWS credential chain (environment,
    /// profile, web identity, container and instance metadata).
    ///
    /// # Errors
    ///
    /// Fails if no credentials provider can be resolved or the HTTP client
    /// cannot be built.
    pub async fn from_config(config: &SqsOutConfig) -> Result<Self, ConfigError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or(ConfigError::MissingCredentials)?;
        Self::new(config, credentials)
    }

    fn signing_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        identity: &Identity,
    ) -> Result<Vec<(String, String)>, DispatchError> {
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| DispatchError::Signing(e.to_string()))?
            .into();

        let signable = SignableRequest::new(
            "POST",
            url,
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| DispatchError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| DispatchError::Signing(e.to_string()))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}

#[async_trait]
impl QueueClient for SqsClient {
    async fn send_batch(&self, request: &SendBatchRequest) -> Result<SendBatchOutput, DispatchError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| DispatchError::Transport(format!("failed to encode request: {e}")))?;
        let url = format!("{}/", self.endpoint);

        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| DispatchError::Credentials(e.to_string()))?;
        let identity = Identity::from(credentials);

        let headers = [
            ("content-type", CONTENT_TYPE),
            ("x-amz-target", SEND_MESSAGE_BATCH_TARGET),
        ];
        let signed = self.signing_headers(&url, &headers, &body, &identity)?;

        let mut builder = self.client.post(&url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        debug!(
            "Sending {} entries to {}",
            request.entries.len(),
            request.queue_url
        );
        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        let query_error = response
            .headers()
            .get(QUERY_ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(service_error(status.as_u16(), query_error.as_deref(), &text));
        }

        serde_json::from_str(&text).map_err(|e| DispatchError::InvalidResponse(e.to_string()))
    }
}

/// Maps an error response onto [`DispatchError::Service`].
///
/// The code comes from the `x-amzn-query-error` header when present (the
/// legacy `AWS.SimpleQueueService.*` form), otherwise from the `__type`
/// field of the body with its namespace stripped.
fn service_error(status: u16, query_error: Option<&str>, body: &str) -> DispatchError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = query_error
        .and_then(|header| header.split(';').next())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .or_else(|| {
            field("__type").map(|t| t.rsplit('#').next().unwrap_or_default().to_string())
        })
        .unwrap_or_else(|| "Unknown".to_string());
    let message = field("message")
        .or_else(|| field("Message"))
        .unwrap_or_else(|| body.to_string());

    DispatchError::Service {
        status,
        code,
        message,
    }
}

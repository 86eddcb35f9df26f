// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::aggregator::SqsMessage;
use crate::config::SqsOutConfig;
use crate::errors::DispatchError;
use crate::sqs::{BatchEntry, MessageAttribute, QueueClient, SendBatchOutput, SendBatchRequest};

/// Sends pending batches to the queue and reports per-message outcomes.
///
/// One call to [`Flusher::flush`] is exactly one `SendMessageBatch` request.
/// Nothing is retried here: a failed request is returned to the caller, and
/// rejected entries are only logged.
#[derive(Clone)]
pub struct Flusher {
    client: Arc<dyn QueueClient>,
    config: Arc<SqsOutConfig>,
}

impl Flusher {
    #[must_use]
    pub fn new(client: Arc<dyn QueueClient>, config: Arc<SqsOutConfig>) -> Self {
        Flusher { client, config }
    }

    fn build_request(&self, messages: Vec<SqsMessage>) -> SendBatchRequest {
        let group_id = if self.config.is_fifo() {
            self.config.message_group_id.clone()
        } else {
            None
        };

        let entries = messages
            .into_iter()
            .map(|message| {
                let mut message_attributes = BTreeMap::new();
                if let Some(attribute) = &self.config.tag_attribute {
                    message_attributes
                        .insert(attribute.clone(), MessageAttribute::string(&message.tag));
                }
                BatchEntry {
                    id: message.id,
                    message_body: message.body,
                    message_group_id: group_id.clone(),
                    message_attributes,
                }
            })
            .collect();

        SendBatchRequest {
            queue_url: self.config.queue_url.clone(),
            entries,
        }
    }

    /// Flush the given messages as a single batch.
    ///
    /// Returns `Ok` whenever the service answered, including when it rejected
    /// some entries; each rejection is logged at error level with its code.
    pub async fn flush(&self, messages: Vec<SqsMessage>) -> Result<SendBatchOutput, DispatchError> {
        if messages.is_empty() {
            debug!("No pending messages to flush");
            return Ok(SendBatchOutput::default());
        }

        let request = self.build_request(messages);
        let n_messages = request.entries.len();
        debug!("Flushing {n_messages} messages to {}", request.queue_url);

        let output = match self.client.send_batch(&request).await {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to send batch of {n_messages} messages: {e}");
                return Err(e);
            }
        };

        for succeeded in &output.successful {
            debug!("Message {} sent", succeeded.id);
        }
        for failed in &output.failed {
            match &failed.message {
                Some(message) => error!(
                    "Message {} failed: {}: {}",
                    failed.id, failed.code, message
                ),
                None => error!("Message {} failed: {}", failed.id, failed.code),
            }
        }

        if output.has_failures() {
            info!(
                "Sent batch of {n_messages} messages, {} rejected",
                output.failed.len()
            );
        } else {
            info!("Sent batch of {n_messages} messages");
        }
        Ok(output)
    }
}

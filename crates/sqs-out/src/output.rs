// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ingestion handle called by the host pipeline.
//!
//! `submit` serializes a record, appends it to the pending batch and, once
//! the batch reaches the configured size, dispatches it. `flush_pending` is
//! the shutdown hook that dispatches whatever is left.
//!
//! Append, threshold check, dispatch and reset run under one lock, so a batch
//! is flushed exactly once even when several tasks submit concurrently. The
//! lock is held across the network call; a slow send therefore back-pressures
//! ingestion instead of growing the batch past its bound.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::aggregator::PendingBatch;
use crate::config::SqsOutConfig;
use crate::errors::{ConfigError, Error};
use crate::flusher::Flusher;
use crate::record::{serialize_record, FieldValue};
use crate::sqs::{QueueClient, SqsClient};

/// Ingestion handle for one queue.
///
/// Records are serialized on arrival and held in a pending batch; the record
/// that fills the batch triggers its dispatch. Safe to share between tasks:
/// appending, the threshold check, the flush and the reset all happen under
/// one lock, so each full batch is sent exactly once.
pub struct SqsOut {
    config: Arc<SqsOutConfig>,
    batch: Mutex<PendingBatch>,
    flusher: Flusher,
}

impl SqsOut {
    /// Builds the handle over an already validated configuration and any
    /// [`QueueClient`].
    #[must_use]
    pub fn new(config: Arc<SqsOutConfig>, client: Arc<dyn QueueClient>) -> Self {
        SqsOut {
            batch: Mutex::new(PendingBatch::new(config.batch_size)),
            flusher: Flusher::new(client, Arc::clone(&config)),
            config,
        }
    }

    /// Validates the configuration and connects it to SQS with the default
    /// AWS credential chain.
    ///
    /// # Errors
    ///
    /// Any configuration error; no record is accepted in that case.
    pub async fn from_config(config: SqsOutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = SqsClient::from_config(&config).await?;
        Ok(Self::new(Arc::new(config), Arc::new(client)))
    }

    #[must_use]
    pub fn config(&self) -> &SqsOutConfig {
        &self.config
    }

    /// Accepts one record.
    ///
    /// # Errors
    ///
    /// [`Error::Encoding`] if the record cannot be serialized; it is dropped
    /// and the batch is untouched. [`Error::Dispatch`] if this record filled
    /// the batch and sending it failed; the batch is discarded either way.
    pub async fn submit(
        &self,
        timestamp: &DateTime<Utc>,
        tag: &str,
        record: &[(String, FieldValue)],
    ) -> Result<(), Error> {
        let body = match serialize_record(timestamp, tag, record) {
            Ok(body) => body,
            Err(e) => {
                error!("Dropping record with tag {tag}: {e}");
                return Err(e.into());
            }
        };

        let mut batch = self.batch.lock().await;
        if !batch.push(body, tag) {
            return Ok(());
        }

        let messages = batch.take();
        self.flusher.flush(messages).await?;
        Ok(())
    }

    /// Dispatches a partially filled batch. Called once no more records will
    /// arrive.
    ///
    /// # Errors
    ///
    /// [`Error::Dispatch`] if the send failed; the messages are discarded.
    pub async fn flush_pending(&self) -> Result<(), Error> {
        let mut batch = self.batch.lock().await;
        if batch.is_empty() {
            debug!("Nothing pending at shutdown");
            return Ok(());
        }

        let messages = batch.take();
        debug!("Flushing {} pending messages at shutdown", messages.len());
        self.flusher.flush(messages).await?;
        Ok(())
    }

    /// Number of messages waiting for the next flush.
    pub async fn pending(&self) -> usize {
        self.batch.lock().await.len()
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Size-bounded accumulation of serialized messages.

/// Prefix of the batch-local message identifiers.
pub const MESSAGE_ID_PREFIX: &str = "MessageNumber-";

/// A serialized record waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsMessage {
    /// `MessageNumber-<n>`, unique within the batch.
    pub id: String,
    pub body: String,
    pub tag: String,
}

/// Messages added since the last flush, in submission order.
///
/// `push` reports when the batch reached its configured size; the owner must
/// then `take` it, which empties the batch and resets the counter. The length
/// therefore never exceeds `batch_size`.
#[derive(Debug)]
pub struct PendingBatch {
    messages: Vec<SqsMessage>,
    counter: usize,
    batch_size: usize,
}

impl PendingBatch {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            messages: Vec::with_capacity(batch_size),
            counter: 0,
            batch_size,
        }
    }

    /// Appends a message and returns `true` when the batch is due for a flush.
    pub fn push(&mut self, body: String, tag: &str) -> bool {
        self.counter += 1;
        self.messages.push(SqsMessage {
            id: format!("{MESSAGE_ID_PREFIX}{}", self.counter),
            body,
            tag: tag.to_string(),
        });
        self.is_full()
    }

    /// Empties the batch and resets the counter.
    pub fn take(&mut self) -> Vec<SqsMessage> {
        self.counter = 0;
        std::mem::replace(&mut self.messages, Vec::with_capacity(self.batch_size))
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.batch_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Number of messages appended since the last [`PendingBatch::take`];
    /// the suffix of the most recent message id.
    #[must_use]
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Size at which [`PendingBatch::push`] reports the batch as full.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Pending messages in submission order.
    #[must_use]
    pub fn messages(&self) -> &[SqsMessage] {
        &self.messages
    }
}

// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory substitute for the SQS client.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sqs_out::errors::DispatchError;
use sqs_out::sqs::{QueueClient, SendBatchOutput, SendBatchRequest, SucceededEntry};

/// Records every request. Answers with the queued results in order, then
/// with "every entry succeeded".
#[derive(Default)]
pub struct RecordingSqs {
    requests: Mutex<Vec<SendBatchRequest>>,
    results: Mutex<VecDeque<Result<SendBatchOutput, DispatchError>>>,
}

#[allow(dead_code)]
impl RecordingSqs {
    pub fn with_results(results: Vec<Result<SendBatchOutput, DispatchError>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            results: Mutex::new(results.into()),
        }
    }

    pub fn requests(&self) -> Vec<SendBatchRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl QueueClient for RecordingSqs {
    async fn send_batch(&self, request: &SendBatchRequest) -> Result<SendBatchOutput, DispatchError> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push(request.clone());

        let scripted = self.results.lock().expect("lock poisoned").pop_front();
        scripted.unwrap_or_else(|| {
            Ok(SendBatchOutput {
                successful: request
                    .entries
                    .iter()
                    .map(|entry| SucceededEntry {
                        id: entry.id.clone(),
                        message_id: None,
                    })
                    .collect(),
                failed: Vec::new(),
            })
        })
    }
}

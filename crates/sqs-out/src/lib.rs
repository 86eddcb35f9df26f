// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batches structured log records into JSON messages and delivers them to
//! Amazon SQS with `SendMessageBatch`.
//!
//! ```text
//! host pipeline -> record -> aggregator -> (batch full / shutdown) -> flusher -> SQS
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod flusher;
pub mod http;
pub mod logger;
pub mod output;
pub mod record;
pub mod sqs;

pub use config::{QueueMode, SqsOutConfig};
pub use errors::{ConfigError, DispatchError, EncodingError, Error};
pub use output::SqsOut;
pub use record::{FieldValue, Record};

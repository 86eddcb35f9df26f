// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode};

use chrono::Utc;
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use sqs_out::{logger, FieldValue, Record, SqsOut, SqsOutConfig};

const DEFAULT_TAG: &str = "stdin";

/// Turns one input line into a record. Only JSON objects are accepted.
fn parse_line(line: &str) -> Result<Record, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, FieldValue::from(value)))
            .collect()),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match SqsOutConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sqs-out | error | invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(config.log_level) {
        eprintln!("sqs-out | error | failed to install logger: {e}");
    }
    debug!("Logging subsystem enabled");

    let tag = env::var("SQS_OUT_TAG").unwrap_or_else(|_| DEFAULT_TAG.to_string());
    let queue_url = config.queue_url.clone();
    let batch_size = config.batch_size;

    let output = match SqsOut::from_config(config).await {
        Ok(output) => output,
        Err(e) => {
            error!("Error creating SQS output: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Forwarding stdin to {queue_url} in batches of {batch_size}");

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("End of input");
                break;
            }
            Err(e) => {
                error!("Failed to read from stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_line(&line) {
            Ok(record) => record,
            Err(e) => {
                error!("Skipping input line: {e}");
                continue;
            }
        };

        // Encoding and dispatch failures are logged at error tier by the output.
        if let Err(e) = output.submit(&Utc::now(), &tag, &record).await {
            debug!("Record not delivered: {e}");
        }
    }

    if output.flush_pending().await.is_err() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

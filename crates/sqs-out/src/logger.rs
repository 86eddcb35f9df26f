// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tiered diagnostic output.
//!
//! Every line names its tier and the subsystem (module target) it came from:
//!
//! ```text
//! sqs-out | info | sqs_out::flusher: Sent batch of 10 messages
//! sqs-out | error | sqs_out::flusher: Message MessageNumber-3 failed: InternalError
//! ```
//!
//! The tier gate is an [`EnvFilter`] built from [`LogLevel`]. Error-tier
//! events pass every setting. The HTTP and AWS crates underneath the client
//! are switched off entirely so only this subsystem's own events are written.

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields, MakeWriter,
};
use tracing_subscriber::registry::LookupSpan;

/// Prefix written at the start of every log line.
pub const LOG_PREFIX: &str = "sqs-out";

/// Dependency targets that never reach the output, whatever the tier.
const SILENCED_TARGETS: [&str; 7] = [
    "h2",
    "hyper",
    "hyper_util",
    "rustls",
    "aws_config",
    "aws_smithy_runtime",
    "aws_sigv4",
];

/// The three output tiers, from most to least verbose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
}

impl LogLevel {
    /// Lenient parse for configuration input: anything that is not
    /// `debug`, `info` or `error` (any case) falls back to `Info`.
    #[must_use]
    pub fn from_setting(setting: &str) -> Self {
        LogLevel::from_str(setting.trim()).unwrap_or_default()
    }

    /// Filter directives for this tier, e.g. `h2=off,hyper=off,...,info`.
    #[must_use]
    pub fn directives(self) -> String {
        let mut directives: Vec<String> = SILENCED_TARGETS
            .iter()
            .map(|target| format!("{target}=off"))
            .collect();
        directives.push(self.as_ref().to_string());
        directives.join(",")
    }

    #[must_use]
    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::new(self.directives())
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: debug, info, error"
            )),
        }
    }
}

/// Event formatter producing `sqs-out | <tier> | <target>: <message>` lines.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

fn tier_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        _ => "trace",
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            &mut writer,
            "{LOG_PREFIX} | {} | {}: ",
            tier_name(metadata.level()),
            metadata.target()
        )?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds the subscriber used by [`init`] over an arbitrary writer.
pub fn subscriber<W>(level: LogLevel, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(level.env_filter())
        .with_ansi(false)
        .with_writer(writer)
        .event_format(Formatter)
        .finish()
}

/// Installs the process-wide subscriber writing to stdout.
///
/// # Errors
///
/// Fails if a global subscriber was already installed.
pub fn init(level: LogLevel) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(subscriber(level, std::io::stdout))
}

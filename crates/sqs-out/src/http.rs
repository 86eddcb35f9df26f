// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

use crate::config::SqsOutConfig;
use crate::errors::ConfigError;

/// Builds the HTTP client used to reach SQS.
///
/// The request timeout comes from the configuration; the subsystem itself
/// never times out a send. A configured proxy applies to every scheme.
///
/// # Errors
///
/// [`ConfigError::InvalidProxyUrl`] if reqwest rejects the proxy address,
/// [`ConfigError::HttpClient`] if the TLS backend cannot be initialized.
pub fn get_client(config: &SqsOutConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .pool_idle_timeout(Duration::from_secs(270))
        .tcp_keepalive(Duration::from_secs(120));

    if let Some(proxy) = &config.proxy_url {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| ConfigError::InvalidProxyUrl(format!("{proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of the connectivity self-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Reachable,
    UnexpectedStatus(u16),
    Unreachable(String),
}

/// GET the ping URL and expect `204 No Content`.
/// Informational only; the scan runs regardless of the outcome.
pub async fn check_connectivity(client: &Client, url: &str, timeout: Duration) -> ConnectivityStatus {
    tracing::info!("Testing network connectivity via {}", url);

    let status = match client.get(url).timeout(timeout).send().await {
        Ok(response) if response.status() == StatusCode::NO_CONTENT => ConnectivityStatus::Reachable,
        Ok(response) => ConnectivityStatus::UnexpectedStatus(response.status().as_u16()),
        Err(e) => ConnectivityStatus::Unreachable(e.to_string()),
    };

    match &status {
        ConnectivityStatus::Reachable => tracing::info!("Network connectivity OK"),
        ConnectivityStatus::UnexpectedStatus(code) => tracing::warn!(
            "Connectivity check returned status {}, check the network environment",
            code
        ),
        ConnectivityStatus::Unreachable(e) => tracing::warn!(
            "Connectivity check failed: {}, check DNS or network settings",
            e
        ),
    }

    status
}

use super::{aggregator::ResultAggregator, probe::PortProbe};
use crate::{
    config::ProbeConfig,
    error::AppError,
    models::{Candidate, VerifiedEndpoint},
};
use futures::stream::{self, StreamExt};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::Semaphore;

/// Settings for one reachability pass
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub default_ports: Vec<u16>,
    pub timeout: Duration,
    pub max_concurrent_candidates: usize,
    pub ports_per_candidate: usize,
}

impl From<&ProbeConfig> for VerifyOptions {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            default_ports: config.default_ports.clone(),
            timeout: config.timeout,
            max_concurrent_candidates: config.max_concurrent_candidates,
            ports_per_candidate: config.ports_per_candidate,
        }
    }
}

/// Probe every candidate and collect the ports that accepted a connection.
///
/// Candidates run as separate tasks, at most `max_concurrent_candidates` at a
/// time; each candidate probes at most `ports_per_candidate` ports at a time.
pub async fn verify<P: PortProbe>(
    candidates: HashSet<Candidate>,
    options: &VerifyOptions,
    probe: Arc<P>,
) -> Result<ResultAggregator, AppError> {
    tracing::info!(
        "Starting reachability checks for {} candidates (default ports {:?}, concurrency {})",
        candidates.len(),
        options.default_ports,
        options.max_concurrent_candidates
    );

    let aggregator = Arc::new(ResultAggregator::new());
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent_candidates.max(1)));
    let default_ports: Arc<[u16]> = options.default_ports.clone().into();

    let handles = candidates
        .into_iter()
        .map(|candidate| {
            let aggregator = aggregator.clone();
            let semaphore = semaphore.clone();
            let probe = probe.clone();
            let default_ports = default_ports.clone();
            let probe_timeout = options.timeout;
            let ports_per_candidate = options.ports_per_candidate;

            tokio::spawn(async move {
                // Acquire permit from semaphore (this limits concurrency)
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::TaskJoinError(e.to_string()))?;

                let ports = candidate.ports_to_probe(&default_ports);
                let open_ports = probe_ports(
                    probe.as_ref(),
                    candidate,
                    &ports,
                    probe_timeout,
                    ports_per_candidate,
                )
                .await;

                if open_ports.is_empty() {
                    tracing::debug!(
                        "Node unavailable: {} (ports checked: {:?})",
                        candidate.address,
                        ports
                    );
                }
                for port in open_ports {
                    tracing::info!("Node available: {}:{}", candidate.address, port);
                    aggregator.record(VerifiedEndpoint::new(candidate.address, port));
                }

                Ok::<(), AppError>(())
            })
        })
        .collect::<Vec<_>>();

    for result in futures::future::join_all(handles).await {
        result??;
    }

    let aggregator = Arc::try_unwrap(aggregator).unwrap_or_else(|shared| shared.take());

    tracing::info!(
        "Reachability checks complete: {} live endpoints",
        aggregator.len()
    );

    Ok(aggregator)
}

/// Probe one candidate's ports with bounded fan-out, returning the open ones
async fn probe_ports<P: PortProbe>(
    probe: &P,
    candidate: Candidate,
    ports: &[u16],
    probe_timeout: Duration,
    ports_per_candidate: usize,
) -> Vec<u16> {
    let width = ports_per_candidate.min(ports.len()).max(1);

    stream::iter(ports.iter().copied())
        .map(|port| async move {
            let status = probe.probe(candidate.address, port, probe_timeout).await;
            (port, status)
        })
        .buffer_unordered(width)
        .filter_map(|(port, status)| async move { status.is_open().then_some(port) })
        .collect::<Vec<_>>()
        .await
}

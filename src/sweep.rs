use crate::{
    discovery::{discover, SourceFetcher, SourceTransport},
    error::AppError,
    models::{Candidate, VerifiedEndpoint},
    reachability::{verify, PortProbe, VerifyOptions},
    utils::is_valid_public_ip,
};
use std::{collections::HashSet, sync::Arc};

/// Run discovery followed by reachability and return the ordered live endpoints.
///
/// The reachability phase only starts once every source has resolved. With
/// `public_only`, non-public addresses are dropped between the two phases.
pub async fn run_sweep<T: SourceTransport, P: PortProbe>(
    fetcher: Arc<SourceFetcher<T>>,
    sources: &[String],
    max_concurrent_fetches: usize,
    public_only: bool,
    probe: Arc<P>,
    options: &VerifyOptions,
) -> Result<Vec<VerifiedEndpoint>, AppError> {
    let candidates = discover(fetcher, sources, max_concurrent_fetches).await?;

    if candidates.is_empty() {
        tracing::warn!("No candidates discovered from {} sources", sources.len());
        return Ok(Vec::new());
    }

    let mut candidates = candidates.freeze();
    if public_only {
        candidates = keep_public(candidates);
        if candidates.is_empty() {
            tracing::warn!("No public candidates left to check");
            return Ok(Vec::new());
        }
    }

    let verified = verify(candidates, options, probe).await?;

    Ok(verified.finalize())
}

fn keep_public(candidates: HashSet<Candidate>) -> HashSet<Candidate> {
    let total = candidates.len();
    let kept: HashSet<Candidate> = candidates
        .into_iter()
        .filter(|c| is_valid_public_ip(&c.address))
        .collect();
    tracing::info!(
        "Dropped {} non-public candidates, {} remain",
        total - kept.len(),
        kept.len()
    );
    kept
}

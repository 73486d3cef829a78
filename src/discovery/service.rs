use super::{
    extractor::extract_candidates,
    fetcher::{SourceFetcher, SourceTransport},
};
use crate::{error::AppError, models::Candidate};
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Semaphore;

/// Candidates gathered during discovery. Concurrent fetch tasks insert into it;
/// `freeze` hands the finished set to the reachability phase.
#[derive(Debug, Default)]
pub struct CandidateSet {
    inner: Mutex<HashSet<Candidate>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of candidates, returning how many were new
    pub fn extend(&self, candidates: impl IntoIterator<Item = Candidate>) -> usize {
        let mut guard = self.inner.lock();
        let before = guard.len();
        guard.extend(candidates);
        guard.len() - before
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the contents out into a new set, leaving this one empty
    fn take(&self) -> CandidateSet {
        CandidateSet {
            inner: Mutex::new(std::mem::take(&mut *self.inner.lock())),
        }
    }

    /// Stop accepting inserts and take the collected candidates
    pub fn freeze(self) -> HashSet<Candidate> {
        self.inner.into_inner()
    }
}

/// Fetch every source concurrently and merge the addresses they contain.
///
/// Sources that fail after all retries contribute nothing. Only a failed
/// worker task is reported as an error.
pub async fn discover<T: SourceTransport>(
    fetcher: Arc<SourceFetcher<T>>,
    sources: &[String],
    max_concurrent: usize,
) -> Result<CandidateSet, AppError> {
    tracing::info!(
        "Starting discovery across {} sources with concurrency of {}",
        sources.len(),
        max_concurrent
    );

    let candidates = Arc::new(CandidateSet::new());
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let handles = sources
        .iter()
        .map(|url| {
            let fetcher = fetcher.clone();
            let candidates = candidates.clone();
            let semaphore = semaphore.clone();
            let url = url.clone();

            tokio::spawn(async move {
                // Acquire permit from semaphore (this limits concurrency)
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::TaskJoinError(e.to_string()))?;

                match fetcher.fetch(&url).await {
                    Ok(text) => {
                        let found = extract_candidates(&text);
                        let found_count = found.len();
                        let added = candidates.extend(found);
                        tracing::info!(
                            "Extracted {} candidates from {} ({} new)",
                            found_count,
                            url,
                            added
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Skipping source {}: {}", url, e);
                    }
                }
                Ok::<(), AppError>(())
            })
        })
        .collect::<Vec<_>>();

    for result in futures::future::join_all(handles).await {
        result??;
    }

    let candidates = Arc::try_unwrap(candidates).unwrap_or_else(|shared| shared.take());

    tracing::info!(
        "Discovery complete: {} unique candidates",
        candidates.len()
    );

    Ok(candidates)
}

use crate::{config::FetchConfig, error::AppError, utils::decode_body};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;

/// Upper bound of the random delay added to each backoff
const MAX_JITTER_MS: u64 = 100;

/// Longest delay between two attempts, however many retries are configured
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A single GET of a source, without retries
#[async_trait]
pub trait SourceTransport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// reqwest-backed transport with a fixed per-request timeout
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SourceTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

/// Fetches source text with a bounded number of attempts
pub struct SourceFetcher<T> {
    transport: T,
    retry_limit: u32,
    retry_backoff: Duration,
}

impl<T: SourceTransport> SourceFetcher<T> {
    pub fn new(transport: T, retry_limit: u32, retry_backoff: Duration) -> Self {
        Self {
            transport,
            retry_limit,
            retry_backoff,
        }
    }

    pub fn from_config(transport: T, config: &FetchConfig) -> Self {
        Self::new(transport, config.retry_limit, config.retry_backoff)
    }

    /// Fetch a source as text, making at most `retry_limit + 1` attempts
    pub async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let max_attempts = self.retry_limit.saturating_add(1);
        let mut backoff = self.retry_backoff;
        let mut attempt = 1;

        loop {
            tracing::debug!("Fetching {} (attempt {}/{})", url, attempt, max_attempts);

            match self.transport.get(url).await {
                Ok(bytes) => {
                    tracing::info!("Fetched {} bytes from {}", bytes.len(), url);
                    return Ok(decode_body(bytes));
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "Fetch of {} failed on attempt {}/{}: {}. Retrying in {:?}",
                        url,
                        attempt,
                        max_attempts,
                        e,
                        backoff
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(with_jitter(backoff)).await;
                        backoff = next_backoff(backoff);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Fetch of {} failed on final attempt {}/{}: {}",
                        url,
                        attempt,
                        max_attempts,
                        e
                    );
                    return Err(AppError::FetchFailed {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

fn with_jitter(delay: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
    delay.saturating_add(Duration::from_millis(jitter))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Transport that fails a fixed number of times per URL before answering
    pub(crate) struct ScriptedTransport {
        bodies: HashMap<String, String>,
        failures_before_success: u32,
        attempts: Mutex<HashMap<String, u32>>,
        total: AtomicU32,
    }

    impl ScriptedTransport {
        pub(crate) fn new(bodies: &[(&str, &str)], failures_before_success: u32) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                failures_before_success,
                attempts: Mutex::new(HashMap::new()),
                total: AtomicU32::new(0),
            }
        }

        pub(crate) fn attempts_for(&self, url: &str) -> u32 {
            self.attempts.lock().get(url).copied().unwrap_or(0)
        }

        fn total_attempts(&self) -> u32 {
            self.total.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>, AppError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            let attempt = {
                let mut attempts = self.attempts.lock();
                let count = attempts.entry(url.to_string()).or_insert(0);
                *count += 1;
                *count
            };

            if attempt <= self.failures_before_success {
                return Err(AppError::RequestError("connection reset".to_string()));
            }
            match self.bodies.get(url) {
                Some(body) => Ok(body.clone().into_bytes()),
                None => Err(AppError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    #[tokio::test]
    async fn persistent_failure_makes_retry_limit_plus_one_attempts() {
        let fetcher = SourceFetcher::new(ScriptedTransport::new(&[], 0), 2, Duration::ZERO);

        let err = fetcher.fetch("http://lists.test/missing").await.unwrap_err();

        assert!(matches!(err, AppError::FetchFailed { attempts: 3, .. }));
        assert_eq!(fetcher.transport.total_attempts(), 3);
    }

    #[tokio::test]
    async fn success_on_final_attempt_stops_retrying() {
        let url = "http://lists.test/a";
        let fetcher = SourceFetcher::new(
            ScriptedTransport::new(&[(url, "1.2.3.4")], 2),
            2,
            Duration::ZERO,
        );

        let body = fetcher.fetch(url).await.unwrap();

        assert_eq!(body, "1.2.3.4");
        assert_eq!(fetcher.transport.attempts_for(url), 3);
    }

    #[tokio::test]
    async fn zero_retry_limit_means_single_attempt() {
        let url = "http://lists.test/a";
        let fetcher = SourceFetcher::new(
            ScriptedTransport::new(&[(url, "1.2.3.4")], 1),
            0,
            Duration::ZERO,
        );

        assert!(fetcher.fetch(url).await.is_err());
        assert_eq!(fetcher.transport.attempts_for(url), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_applied_between_attempts() {
        let url = "http://lists.test/a";
        let fetcher = SourceFetcher::new(
            ScriptedTransport::new(&[(url, "ok")], 2),
            2,
            Duration::from_millis(500),
        );

        let started = tokio::time::Instant::now();
        fetcher.fetch(url).await.unwrap();

        // 500ms + 1000ms, plus up to 100ms jitter each
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed <= Duration::from_millis(1700));
    }

    #[tokio::test]
    async fn huge_retry_limit_does_not_overflow() {
        let url = "http://lists.test/a";
        let fetcher = SourceFetcher::new(
            ScriptedTransport::new(&[(url, "1.2.3.4")], 1),
            u32::MAX,
            Duration::ZERO,
        );

        let body = fetcher.fetch(url).await.unwrap();

        assert_eq!(body, "1.2.3.4");
        assert_eq!(fetcher.transport.attempts_for(url), 2);
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        assert_eq!(
            next_backoff(Duration::from_millis(500)),
            Duration::from_secs(1)
        );
        assert_eq!(next_backoff(Duration::from_secs(20)), MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::MAX), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn long_retry_chains_stay_within_the_cap() {
        let url = "http://lists.test/a";
        let fetcher = SourceFetcher::new(
            ScriptedTransport::new(&[(url, "ok")], 8),
            8,
            Duration::from_secs(10),
        );

        let started = tokio::time::Instant::now();
        fetcher.fetch(url).await.unwrap();

        // 10s + 20s, then six waits capped at 30s, plus up to 100ms jitter each
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(210));
        assert!(elapsed <= Duration::from_millis(210_800));
    }

    /// Serve one canned HTTP response per connection on a local port
    async fn serve_http(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status_line,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/list.txt", addr)
    }

    #[tokio::test]
    async fn http_transport_returns_body_on_success() {
        let url = serve_http("200 OK", b"1.2.3.4\n5.6.7.8:9000\n").await;
        let transport = HttpTransport::new(Client::new(), Duration::from_secs(5));

        let body = transport.get(&url).await.unwrap();

        assert_eq!(body, b"1.2.3.4\n5.6.7.8:9000\n".to_vec());
    }

    #[tokio::test]
    async fn http_transport_treats_non_success_status_as_failure() {
        let url = serve_http("404 Not Found", b"missing").await;
        let transport = HttpTransport::new(Client::new(), Duration::from_secs(5));

        let err = transport.get(&url).await.unwrap_err();

        assert!(matches!(err, AppError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn fetcher_decodes_latin1_bodies() {
        let url = serve_http("200 OK", b"9.9.9.9 caf\xe9").await;
        let fetcher = SourceFetcher::new(
            HttpTransport::new(Client::new(), Duration::from_secs(5)),
            0,
            Duration::ZERO,
        );

        let text = fetcher.fetch(&url).await.unwrap();

        assert_eq!(text, "9.9.9.9 café");
    }
}

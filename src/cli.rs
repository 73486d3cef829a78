use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface for ipsweep
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "ipsweep",
    about = "Collects IPv4 endpoints from remote lists, keeps the ones that accept TCP connections and tags them by country",
    version
)]
pub struct Cli {
    /// Source URL to collect addresses from (repeatable, or comma separated)
    #[clap(long = "source", env = "IPSWEEP_SOURCES", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Ports probed for addresses listed without a port
    #[clap(long = "port", env = "IPSWEEP_PORTS", value_delimiter = ',', default_value = "443")]
    pub ports: Vec<u16>,

    /// Maximum number of sources fetched concurrently
    #[clap(long, env = "IPSWEEP_MAX_CONCURRENT_FETCHES", default_value = "5")]
    pub max_concurrent_fetches: usize,

    /// Maximum number of candidates probed concurrently
    #[clap(long, env = "IPSWEEP_MAX_CONCURRENT_PROBES", default_value = "30")]
    pub max_concurrent_probes: usize,

    /// Maximum number of ports probed concurrently for a single candidate
    #[clap(long, env = "IPSWEEP_PORTS_PER_CANDIDATE", default_value = "4")]
    pub ports_per_candidate: usize,

    /// Additional attempts made for a source after the first one fails
    #[clap(long, env = "IPSWEEP_RETRY_LIMIT", default_value = "2")]
    pub retry_limit: u32,

    /// Base delay between source fetch attempts in milliseconds (doubles per attempt, 0 = retry immediately)
    #[clap(long, env = "IPSWEEP_RETRY_BACKOFF_MS", default_value = "500")]
    pub retry_backoff_ms: u64,

    /// Timeout for a single source fetch attempt in seconds
    #[clap(long, env = "IPSWEEP_REQUEST_TIMEOUT", default_value = "20")]
    pub request_timeout: u64,

    /// Timeout for a single TCP connect in milliseconds
    #[clap(long, env = "IPSWEEP_PROBE_TIMEOUT_MS", default_value = "3000")]
    pub probe_timeout_ms: u64,

    /// Timeout for a geolocation lookup in seconds
    #[clap(long, env = "IPSWEEP_GEO_TIMEOUT", default_value = "5")]
    pub geo_timeout: u64,

    /// Maximum number of geolocation lookups in flight
    #[clap(long, env = "IPSWEEP_GEO_CONCURRENCY", default_value = "8")]
    pub geo_concurrency: usize,

    /// Base URL of the geolocation API (queried as <base>/<ip>/json)
    #[clap(long, env = "IPSWEEP_GEO_ENDPOINT", default_value = "https://ipinfo.io")]
    pub geo_endpoint: String,

    /// URL used for the connectivity self-test (expects HTTP 204)
    #[clap(
        long,
        env = "IPSWEEP_PING_URL",
        default_value = "https://www.gstatic.com/generate_204"
    )]
    pub ping_url: String,

    /// User-Agent header sent with every HTTP request
    #[clap(
        long,
        env = "IPSWEEP_USER_AGENT",
        default_value = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0 Safari/537.36"
    )]
    pub user_agent: String,

    /// File the annotated endpoints are written to
    #[clap(short, long, env = "IPSWEEP_OUTPUT", default_value = "ip.txt")]
    pub output: PathBuf,

    /// Drop private, loopback and reserved addresses before probing
    #[clap(long)]
    pub public_only: bool,

    /// Skip geolocation lookups and mark every endpoint as Unknown
    #[clap(long)]
    pub no_geo: bool,

    /// Skip the connectivity self-test
    #[clap(long)]
    pub skip_connectivity_check: bool,
}

impl Cli {
    /// Get the per-attempt fetch timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Get the TCP connect timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

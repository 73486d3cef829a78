use crate::{cli::Cli, error::AppError};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Lists used when no source is configured
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://raw.githubusercontent.com/Fido6/bestip/refs/heads/dtaa/bestiphk.txt",
    "https://raw.githubusercontent.com/Fido6/bestip/refs/heads/dtaa/bestipjp.txt",
    "https://raw.githubusercontent.com/Fido6/bestip/refs/heads/dtaa/bestipsg.txt",
];

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest accepted `--retry-limit`
pub const MAX_RETRY_LIMIT: u32 = 10;

/// Source fetching settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry_limit: u32,
    pub retry_backoff: Duration,
    pub max_concurrent: usize,
}

/// Reachability settings
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub default_ports: Vec<u16>,
    pub timeout: Duration,
    pub max_concurrent_candidates: usize,
    pub ports_per_candidate: usize,
    pub public_only: bool,
}

/// Geolocation settings
#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout: Duration,
    pub concurrency: usize,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<String>,
    pub fetch: FetchConfig,
    pub probe: ProbeConfig,
    pub geo: GeoConfig,
    /// `None` when the self-test is disabled
    pub ping_url: Option<String>,
    pub connectivity_timeout: Duration,
    pub output: PathBuf,
}

impl Config {
    /// Build and validate the run configuration from parsed arguments
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let sources: Vec<String> = if cli.sources.is_empty() {
            tracing::info!(
                "No sources configured, using {} default lists",
                DEFAULT_SOURCES.len()
            );
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            cli.sources
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        if sources.is_empty() {
            return Err(AppError::ConfigError(
                "at least one source URL is required".to_string(),
            ));
        }
        for source in &sources {
            validate_http_url(source)?;
        }

        if cli.ports.is_empty() {
            return Err(AppError::ConfigError(
                "at least one default port is required".to_string(),
            ));
        }
        if cli.ports.contains(&0) {
            return Err(AppError::ConfigError(
                "port 0 cannot be probed".to_string(),
            ));
        }
        let mut default_ports = cli.ports.clone();
        default_ports.sort_unstable();
        default_ports.dedup();

        require_positive("max-concurrent-fetches", cli.max_concurrent_fetches)?;
        require_positive("max-concurrent-probes", cli.max_concurrent_probes)?;
        require_positive("ports-per-candidate", cli.ports_per_candidate)?;
        require_positive("geo-concurrency", cli.geo_concurrency)?;

        if cli.retry_limit > MAX_RETRY_LIMIT {
            return Err(AppError::ConfigError(format!(
                "retry limit {} exceeds the maximum of {}",
                cli.retry_limit, MAX_RETRY_LIMIT
            )));
        }

        if cli.probe_timeout().is_zero() {
            return Err(AppError::ConfigError(
                "probe timeout must be greater than zero".to_string(),
            ));
        }
        if cli.request_timeout().is_zero() {
            return Err(AppError::ConfigError(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        if !cli.no_geo {
            validate_http_url(&cli.geo_endpoint)?;
        }
        let ping_url = if cli.skip_connectivity_check {
            None
        } else {
            validate_http_url(&cli.ping_url)?;
            Some(cli.ping_url.clone())
        };

        Ok(Config {
            sources,
            fetch: FetchConfig {
                user_agent: cli.user_agent.clone(),
                request_timeout: cli.request_timeout(),
                retry_limit: cli.retry_limit,
                retry_backoff: cli.retry_backoff(),
                max_concurrent: cli.max_concurrent_fetches,
            },
            probe: ProbeConfig {
                default_ports,
                timeout: cli.probe_timeout(),
                max_concurrent_candidates: cli.max_concurrent_probes,
                ports_per_candidate: cli.ports_per_candidate,
                public_only: cli.public_only,
            },
            geo: GeoConfig {
                enabled: !cli.no_geo,
                endpoint: cli.geo_endpoint.trim_end_matches('/').to_string(),
                timeout: cli.geo_timeout(),
                concurrency: cli.geo_concurrency,
            },
            ping_url,
            connectivity_timeout: CONNECTIVITY_TIMEOUT,
            output: cli.output.clone(),
        })
    }
}

fn validate_http_url(raw: &str) -> Result<(), AppError> {
    let parsed = Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::ConfigError(format!(
            "unsupported scheme {} in {}",
            other, raw
        ))),
    }
}

fn require_positive(name: &str, value: usize) -> Result<(), AppError> {
    if value == 0 {
        return Err(AppError::ConfigError(format!("{} must be at least 1", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["ipsweep"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn falls_back_to_default_sources() {
        let config = Config::from_cli(&cli(&[])).unwrap();
        assert_eq!(config.sources.len(), DEFAULT_SOURCES.len());
        assert_eq!(config.probe.default_ports, vec![443]);
        assert_eq!(config.fetch.retry_limit, 2);
        assert_eq!(config.fetch.max_concurrent, 5);
        assert_eq!(config.probe.max_concurrent_candidates, 30);
        assert!(config.ping_url.is_some());
    }

    #[test]
    fn duplicate_default_ports_collapse() {
        let config = Config::from_cli(&cli(&["--port", "443,80,443"])).unwrap();
        assert_eq!(config.probe.default_ports, vec![80, 443]);
    }

    #[test]
    fn rejects_port_zero() {
        let err = Config::from_cli(&cli(&["--port", "0"])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_workers() {
        let err = Config::from_cli(&cli(&["--max-concurrent-probes", "0"])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn rejects_excessive_retry_limit() {
        let err = Config::from_cli(&cli(&["--retry-limit", "4294967295"])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let config = Config::from_cli(&cli(&["--retry-limit", "10"])).unwrap();
        assert_eq!(config.fetch.retry_limit, MAX_RETRY_LIMIT);
    }

    #[test]
    fn rejects_non_http_source() {
        let err = Config::from_cli(&cli(&["--source", "ftp://lists.test/a.txt"])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn skip_flags_disable_collaborators() {
        let config =
            Config::from_cli(&cli(&["--no-geo", "--skip-connectivity-check"])).unwrap();
        assert!(!config.geo.enabled);
        assert!(config.ping_url.is_none());
    }
}

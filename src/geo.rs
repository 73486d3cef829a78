use crate::{
    config::GeoConfig,
    error::AppError,
    models::{AnnotatedEndpoint, IpInfoResponse, VerifiedEndpoint},
};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::{collections::HashMap, net::Ipv4Addr};

pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Attach a country code to every endpoint, keeping the input order.
///
/// Endpoints that share an address share one lookup. Any failure yields
/// `Unknown` for that address.
pub async fn annotate(
    client: &Client,
    endpoints: &[VerifiedEndpoint],
    config: &GeoConfig,
) -> Vec<AnnotatedEndpoint> {
    if !config.enabled {
        return endpoints
            .iter()
            .map(|endpoint| AnnotatedEndpoint {
                endpoint: *endpoint,
                country: UNKNOWN_COUNTRY.to_string(),
            })
            .collect();
    }

    // Get unique addresses only
    let mut unique_addresses: Vec<Ipv4Addr> = endpoints.iter().map(|e| e.address).collect();
    unique_addresses.sort_unstable();
    unique_addresses.dedup();

    tracing::info!(
        "Looking up countries for {} addresses",
        unique_addresses.len()
    );

    let countries: HashMap<Ipv4Addr, String> = stream::iter(unique_addresses)
        .map(|address| async move {
            let country = match lookup_country(client, address, config).await {
                Ok(Some(country)) => country,
                Ok(None) => UNKNOWN_COUNTRY.to_string(),
                Err(e) => {
                    tracing::debug!("Country lookup for {} failed: {}", address, e);
                    UNKNOWN_COUNTRY.to_string()
                }
            };
            (address, country)
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    endpoints
        .iter()
        .map(|endpoint| AnnotatedEndpoint {
            endpoint: *endpoint,
            country: countries
                .get(&endpoint.address)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        })
        .collect()
}

/// Query the geo API for one address
async fn lookup_country(
    client: &Client,
    address: Ipv4Addr,
    config: &GeoConfig,
) -> Result<Option<String>, AppError> {
    let url = format!("{}/{}/json", config.endpoint, address);

    let response = client
        .get(&url)
        .timeout(config.timeout)
        .send()
        .await
        .map_err(|e| AppError::RequestError(format!("Geo API request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::HttpStatus {
            url,
            status: response.status().as_u16(),
        });
    }

    let body = response.bytes().await?;
    let info: IpInfoResponse = serde_json::from_slice(&body)?;

    Ok(info.country.filter(|c| !c.trim().is_empty()))
}

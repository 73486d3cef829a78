// General utility functions for the application
use crate::error::AppError;
use reqwest::Client;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Create the HTTP client shared by source fetches, geolocation and the self-test.
/// Every request sets its own timeout, so only the connect timeout is fixed here.
pub fn create_http_client(user_agent: &str, connect_timeout: Duration) -> Result<Client, AppError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(5)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| AppError::RequestError(format!("Failed to create HTTP client: {}", e)))?;

    Ok(client)
}

/// Whether an address is routable on the public internet
pub fn is_valid_public_ip(addr: &Ipv4Addr) -> bool {
    let octets = addr.octets();

    // RFC 1918 (Private Use)
    if octets[0] == 10
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
    {
        return false;
    }

    // Loopback, link-local, and other special ranges
    if octets[0] == 0 ||     // This network
       octets[0] == 127 ||   // Loopback
       (octets[0] == 100 && (64..=127).contains(&octets[1])) || // Shared address space
       (octets[0] == 169 && octets[1] == 254) || // Link-local
       (octets[0] == 192 && octets[1] == 0 && octets[2] == 0) || // IETF Protocol
       (octets[0] == 192 && octets[1] == 0 && octets[2] == 2) || // TEST-NET-1
       (octets[0] == 198 && octets[1] == 51 && octets[2] == 100) || // TEST-NET-2
       (octets[0] == 203 && octets[1] == 0 && octets[2] == 113) || // TEST-NET-3
       octets[0] >= 224
    // Multicast, reserved and broadcast
    {
        return false;
    }

    true
}

/// Decode a response body, falling back to Latin-1 when it is not valid UTF-8
pub fn decode_body(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            tracing::debug!(
                "Body of {} bytes is not valid UTF-8, decoding as Latin-1",
                bytes.len()
            );
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_addresses_pass() {
        assert!(is_valid_public_ip(&Ipv4Addr::new(1, 1, 1, 1)));
        assert!(is_valid_public_ip(&Ipv4Addr::new(104, 16, 0, 1)));
        assert!(is_valid_public_ip(&Ipv4Addr::new(172, 32, 0, 1)));
    }

    #[test]
    fn special_ranges_are_rejected() {
        for addr in [
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(172, 16, 5, 4),
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(127, 0, 0, 1),
            Ipv4Addr::new(0, 0, 0, 0),
            Ipv4Addr::new(169, 254, 1, 1),
            Ipv4Addr::new(100, 64, 0, 1),
            Ipv4Addr::new(203, 0, 113, 7),
            Ipv4Addr::new(224, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 255),
        ] {
            assert!(!is_valid_public_ip(&addr), "{} should be rejected", addr);
        }
    }

    #[test]
    fn utf8_bodies_decode_unchanged() {
        let body = "1.2.3.4 节点".as_bytes().to_vec();
        assert_eq!(decode_body(body), "1.2.3.4 节点");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        let body = vec![b'1', b'.', b'2', b'.', b'3', b'.', b'4', b' ', 0xff, 0xe9];
        assert_eq!(decode_body(body), "1.2.3.4 ÿé");
    }
}

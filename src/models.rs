use serde::Deserialize;
use std::fmt;
use std::net::Ipv4Addr;

/// An address extracted from a source, optionally with the port it was listed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub address: Ipv4Addr,
    pub port: Option<u16>,
}

impl Candidate {
    pub fn new(address: Ipv4Addr, port: Option<u16>) -> Self {
        Self { address, port }
    }

    /// Ports to probe for this candidate: its own port if it has one, otherwise the defaults
    pub fn ports_to_probe(&self, default_ports: &[u16]) -> Vec<u16> {
        match self.port {
            Some(port) => vec![port],
            None => default_ports.to_vec(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => write!(f, "{}", self.address),
        }
    }
}

/// An address:port pair that accepted a TCP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifiedEndpoint {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl VerifiedEndpoint {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }
}

impl fmt::Display for VerifiedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Outcome of a single TCP connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Open,
    Closed,
}

impl PortStatus {
    pub fn is_open(self) -> bool {
        matches!(self, PortStatus::Open)
    }
}

/// Verified endpoint with its country code attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedEndpoint {
    pub endpoint: VerifiedEndpoint,
    pub country: String,
}

/// Response from the ipinfo-style geo API; only the country is used
#[derive(Debug, Clone, Deserialize)]
pub struct IpInfoResponse {
    pub country: Option<String>,
}

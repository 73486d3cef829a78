use crate::models::PortStatus;
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// A single reachability check of one address:port
#[async_trait]
pub trait PortProbe: Send + Sync + 'static {
    async fn probe(&self, address: Ipv4Addr, port: u16, timeout: Duration) -> PortStatus;
}

/// Full TCP handshake probe
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl PortProbe for TcpProbe {
    async fn probe(&self, address: Ipv4Addr, port: u16, probe_timeout: Duration) -> PortStatus {
        let socket_addr = SocketAddr::V4(SocketAddrV4::new(address, port));

        match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            // The stream is dropped here, closing the connection
            Ok(Ok(_stream)) => PortStatus::Open,
            Ok(Err(e)) => {
                tracing::trace!("Connect to {} failed: {}", socket_addr, e);
                PortStatus::Closed
            }
            Err(_elapsed) => {
                tracing::trace!("Connect to {} timed out after {:?}", socket_addr, probe_timeout);
                PortStatus::Closed
            }
        }
    }
}

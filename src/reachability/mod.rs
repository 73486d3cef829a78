// Modules
mod aggregator;
mod probe;
mod verifier;

// Public exports
pub use probe::{PortProbe, TcpProbe};
pub use verifier::{verify, VerifyOptions};

// Modules
mod address;
mod extractor;
mod fetcher;
mod service;

// Public exports
pub use fetcher::{HttpTransport, SourceFetcher, SourceTransport};
pub use service::discover;

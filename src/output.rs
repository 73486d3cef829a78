use crate::{error::AppError, models::AnnotatedEndpoint};
use std::path::Path;

/// `ip:port#country-port`
pub fn format_line(annotated: &AnnotatedEndpoint) -> String {
    let endpoint = &annotated.endpoint;
    format!(
        "{}:{}#{}-{}",
        endpoint.address, endpoint.port, annotated.country, endpoint.port
    )
}

/// Write one line per endpoint, replacing any existing file
pub async fn write_results(path: &Path, endpoints: &[AnnotatedEndpoint]) -> Result<(), AppError> {
    let mut contents = String::new();
    for annotated in endpoints {
        contents.push_str(&format_line(annotated));
        contents.push('\n');
    }

    tokio::fs::write(path, contents).await.map_err(|e| {
        AppError::IoError(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::info!("Wrote {} endpoints to {}", endpoints.len(), path.display());
    Ok(())
}

//! Response-to-error mapping for the catalog Web API

use bridge_traits::http::HttpResponse;
use core_catalog::{CatalogError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Regular error object returned by the Web API.
///
/// ```json
/// { "error": { "status": 404, "message": "Non existing id" } }
/// ```
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decodes a 2xx body or turns any other status into
/// `CatalogError::Remote(Status)`.
pub(crate) fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if !response.is_success() {
        return Err(status_error(response));
    }

    serde_json::from_slice(&response.body).map_err(|e| {
        warn!(error = %e, "Failed to decode API response");
        CatalogError::Decode(e.to_string())
    })
}

fn status_error(response: &HttpResponse) -> CatalogError {
    let status = response.status;

    if status == 429 {
        // Surfaced only; the caller decides whether to wait.
        warn!(
            retry_after = response.header("Retry-After").unwrap_or("unknown"),
            "API rate limit exceeded"
        );
    }

    let message = serde_json::from_slice::<ApiErrorResponse>(&response.body)
        .ok()
        .and_then(|body| body.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            if text.is_empty() {
                format!("HTTP {status}")
            } else {
                text
            }
        });

    debug!(status, message = %message, "API returned an error status");
    CatalogError::remote_status(status, message)
}

//! Shared HTTP round trip for provider clients
//!
//! Maps transport failures, non-2xx statuses and undecodable bodies onto the
//! crate's error type.

use super::MAX_ERROR_BODY_BYTES;
use crate::error::{Error, Result};
use crate::util::truncate_safe;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Send a JSON request and decode a 2xx JSON body.
///
/// Non-2xx responses become [`Error::Api`] carrying the status and at most
/// [`MAX_ERROR_BODY_BYTES`] of the body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Network(format!("{provider}: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("{provider}: {e}")))?;

    debug!(provider, status = status.as_u16(), bytes = body.len(), "provider responded");

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            body: truncate_safe(&body, MAX_ERROR_BODY_BYTES).to_string(),
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(format!("{provider}: {e}")))
}

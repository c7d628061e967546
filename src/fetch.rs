//! Remote captcha retrieval
//!
//! Downloads captcha content over HTTP with a bounded timeout. Some endpoints
//! wrap the markup in a small JSON envelope; the payload is unwrapped before
//! it reaches the solver.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch captcha content from a URL, blocking until done or timed out
pub fn fetch_content(url: &str) -> Result<Vec<u8>> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(fetch_async(url))
}

async fn fetch_async(url: &str) -> Result<Vec<u8>> {
    debug!("Fetching captcha from {}", url);

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    if !response.status().is_success() {
        bail!("Captcha fetch failed with status {}", response.status());
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?
        .to_vec();

    Ok(unwrap_envelope(content_type.as_deref(), bytes))
}

/// Unwrap a JSON envelope around the captcha payload.
///
/// JSON responses carrying a `content` or `svg` string field yield that
/// field's bytes; everything else passes through untouched.
fn unwrap_envelope(content_type: Option<&str>, bytes: Vec<u8>) -> Vec<u8> {
    let looks_like_json = content_type.is_some_and(|ct| ct.contains("json"))
        || bytes.first().is_some_and(|b| *b == b'{');
    if !looks_like_json {
        return bytes;
    }

    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return bytes;
    };

    for field in ["content", "svg"] {
        if let Some(payload) = value.get(field).and_then(|v| v.as_str()) {
            debug!("Unwrapped captcha payload from JSON field '{}'", field);
            return payload.as_bytes().to_vec();
        }
    }
    bytes
}

use reqwest::StatusCode;

/// A non-success response from an upstream API, with its body captured for the caller.
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    pub status: u16,
    pub body: String,
    /// 429 and 5xx are worth retrying; other client errors (400, 401, 404) are permanent.
    pub retryable: bool,
}

/// Whether a failed status is likely transient.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Pass successful responses through; turn anything else into an [`UpstreamFailure`].
///
/// Requests are single-attempt. The retry decision is left to whoever receives the failure.
pub async fn check_status(
    response: reqwest::Response,
    label: &str,
) -> Result<reqwest::Response, UpstreamFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => json.to_string(),
        Err(_) => body,
    };
    let retryable = is_retryable(status);

    tracing::warn!(
        "[HTTP] {} request failed with status {} (retryable: {}): {}",
        label,
        status,
        retryable,
        body
    );

    Err(UpstreamFailure {
        status: status.as_u16(),
        body,
        retryable,
    })
}

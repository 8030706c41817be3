// Shared HTTP plumbing for the AI providers: client setup, one bounded
// request/response exchange, and mapping failures onto ProviderError.

use crate::core::ProviderError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Build the HTTP client used by every provider
pub fn build_client(request_timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .pool_idle_timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| ProviderError::Unreachable(format!("could not build HTTP client: {}", e)))
}

/// POST a JSON body and decode the JSON reply
///
/// The whole exchange (connect, send, read body) is bounded by `limit`;
/// expiry counts as unreachable.
///
/// # Arguments
/// * `request` - Prepared request builder (URL and auth headers set)
/// * `body` - Request payload
/// * `limit` - Upper bound on the whole exchange
pub async fn post_json<B, R>(
    request: reqwest::RequestBuilder,
    body: &B,
    limit: Duration,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let exchange = async {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "AI provider returned an error status");
            return Err(classify_status(status, &text));
        }

        serde_json::from_str::<R>(&text)
            .map_err(|e| ProviderError::MalformedResponse(format!("unexpected reply body: {}", e)))
    };

    match timeout(limit, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Unreachable(format!(
            "no reply within {}s",
            limit.as_secs_f32()
        ))),
    }
}

/// Map an HTTP error status onto a provider error
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    let detail = format!("HTTP {}", status.as_u16());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthenticated(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(detail),
        // Gemini reports a bad key as a 400
        StatusCode::BAD_REQUEST if lowered.contains("api key") || lowered.contains("api_key") => {
            ProviderError::Unauthenticated(detail)
        }
        _ if lowered.contains("quota") => ProviderError::RateLimited(detail),
        _ => ProviderError::Unreachable(detail),
    }
}

/// Map a transport failure onto a provider error
pub fn classify_transport(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Unreachable("request timed out".to_string())
    } else if error.is_connect() {
        ProviderError::Unreachable("could not connect".to_string())
    } else if error.is_decode() {
        ProviderError::MalformedResponse(error.to_string())
    } else {
        ProviderError::Unreachable(error.to_string())
    }
}

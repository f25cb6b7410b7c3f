use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 30;

/// Delay before the next attempt: `Retry-After` seconds when present, otherwise
/// exponential backoff capped at 30s.
pub(crate) fn retry_delay(response: &reqwest::Response, attempt: u32) -> Duration {
    if let Some(val) = response.headers().get(reqwest::header::RETRY_AFTER)
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Duration::from_secs(secs.min(MAX_BACKOFF_SECS));
    }
    backoff(attempt)
}

fn backoff(attempt: u32) -> Duration {
    let secs = BASE_BACKOFF_SECS
        .checked_shl(attempt)
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// Send an HTTP request, retrying up to `max_retries` times on 429 responses.
///
/// Any other status is handed back to the caller untouched.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` if every attempt was rate limited, or the transport
/// error wrapped as `LlmError::Http`.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    max_retries: u32,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..=max_retries {
        let response = f().await.map_err(LlmError::Http)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if attempt == max_retries {
                return Err(LlmError::RateLimited);
            }
            let delay = retry_delay(&response, attempt);
            tracing::warn!(
                provider = provider_name,
                retry_in_secs = delay.as_secs(),
                attempt = attempt + 1,
                max_retries,
                "rate limited, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        return Ok(response);
    }

    Err(LlmError::RateLimited)
}

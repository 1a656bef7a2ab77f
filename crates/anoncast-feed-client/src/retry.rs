//! Backoff for idempotent feed reads.
//!
//! A read is repeated when the request never produced a response, or when
//! the upstream answered with a status that signals a passing overload
//! (429, 502, 503, 504). Any other response goes back to the caller on the
//! first try. Publishing must not use this module.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

/// Delay schedule for repeated reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    /// Total tries, the first one included.
    pub tries: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            tries: 3,
            first_delay: Duration::from_millis(150),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl Backoff {
    /// Wait before try number `next` (1-based, the first retry is 1).
    fn delay(&self, next: u32) -> Duration {
        let factor = 1u32.checked_shl(next.saturating_sub(1)).unwrap_or(u32::MAX);
        self.first_delay.saturating_mul(factor).min(self.max_delay)
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Run `send` until it yields a settled response or `backoff.tries` runs
/// out. The last outcome is returned unchanged.
pub(crate) async fn send_idempotent<F, Fut>(
    backoff: Backoff,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut tried = 1;
    loop {
        let outcome = send().await;
        let settled = match &outcome {
            Ok(resp) => !is_transient(resp.status()),
            Err(_) => false,
        };
        if settled || tried >= backoff.tries {
            return outcome;
        }

        let wait = backoff.delay(tried);
        match &outcome {
            Ok(resp) => tracing::warn!(status = %resp.status(), ?wait, tried, "feed read throttled"),
            Err(e) => tracing::warn!(error = %e, ?wait, tried, "feed read failed"),
        }
        tokio::time::sleep(wait).await;
        tried += 1;
    }
}

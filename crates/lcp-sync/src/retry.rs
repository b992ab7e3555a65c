//! Retry with exponential backoff for idempotent peer calls.
//!
//! Retries only on transport errors (connection failures, timeouts). The
//! caller inspects the response status; non-2xx answers are never retried.
//! All attempts together, backoff included, must finish within one budget.

use std::time::Duration;

use crate::error::SyncError;

/// Retry attempts after the initial request.
const MAX_RETRIES: u32 = 2;

/// Base delay between retries (doubles each attempt: 200ms, 400ms).
const BASE_DELAY_MS: u64 = 200;

/// Send an HTTP request, retrying transport failures with backoff.
///
/// `f` is called up to `MAX_RETRIES + 1` times and must build a fresh
/// request on each call. The whole sequence is cut off after `budget`.
pub(crate) async fn retry_send<F, Fut>(
    endpoint: &str,
    budget: Duration,
    f: F,
) -> Result<reqwest::Response, SyncError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let attempts = async {
        for attempt in 0..MAX_RETRIES {
            match f().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                    tracing::warn!(
                        endpoint,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "peer request failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        f().await
    };

    match tokio::time::timeout(budget, attempts).await {
        Ok(result) => result.map_err(|e| SyncError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        }),
        Err(_) => Err(SyncError::Timeout {
            endpoint: endpoint.to_string(),
            budget,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn refused() -> impl std::future::Future<Output = Result<reqwest::Response, reqwest::Error>> {
        // Port 1 is closed: connection refused.
        reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap()
            .patch("http://127.0.0.1:1/licenses/x")
            .send()
    }

    #[tokio::test]
    async fn retry_exhausts_all_attempts_on_transport_failure() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();

        let result = retry_send("PATCH /licenses/x", Duration::from_secs(10), || {
            cc.fetch_add(1, Ordering::SeqCst);
            refused()
        })
        .await;

        assert!(matches!(result, Err(SyncError::Http { .. })));
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn budget_bounds_a_hanging_peer() {
        let started = Instant::now();
        let result = retry_send("PATCH /licenses/x", Duration::from_millis(150), || {
            std::future::pending::<Result<reqwest::Response, reqwest::Error>>()
        })
        .await;

        assert!(matches!(result, Err(SyncError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn budget_includes_backoff_delays() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();

        // First failure sleeps 200ms; the budget runs out during that sleep.
        let result = retry_send("PATCH /licenses/x", Duration::from_millis(100), || {
            cc.fetch_add(1, Ordering::SeqCst);
            refused()
        })
        .await;

        assert!(matches!(result, Err(SyncError::Timeout { .. })));
        assert!(call_count.load(Ordering::SeqCst) < MAX_RETRIES + 1);
    }
}

//! Shared HTTP plumbing for hosted embedding providers.

use docsift_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum attempts per request, including the first.
pub(crate) const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the first retry; doubles on each further retry.
pub(crate) const INITIAL_BACKOFF_MS: u64 = 100;

/// Default request timeout in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

pub(crate) fn build_client(provider: &str, timeout_secs: Option<u64>) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(
            timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS),
        ))
        .build()
        .map_err(|e| {
            AppError::ProviderFailure(format!(
                "Failed to create HTTP client for {}: {}",
                provider, e
            ))
        })
}

/// Failure of a single attempt, classified for retrying.
#[derive(Debug)]
enum Attempt {
    Retryable(String),
    Fatal(String),
}

/// POST `body` as JSON and decode the JSON response.
///
/// Transport errors, 429 and 5xx responses are retried with exponential
/// backoff. Everything else fails immediately as `ProviderFailure`.
pub(crate) async fn post_json<B, R>(
    client: &Client,
    provider: &str,
    url: &str,
    bearer: Option<&str>,
    body: &B,
) -> AppResult<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match send_once(client, url, bearer, body).await {
            Ok(response) => return Ok(response),
            Err(Attempt::Fatal(message)) => {
                return Err(AppError::ProviderFailure(format!("{}: {}", provider, message)));
            }
            Err(Attempt::Retryable(message)) => message,
        };

        if attempt >= MAX_ATTEMPTS {
            return Err(AppError::ProviderFailure(format!(
                "{}: {} (after {} attempts)",
                provider, error, attempt
            )));
        }

        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
        warn!(
            "{} request failed (attempt {}/{}), retrying in {}ms: {}",
            provider, attempt, MAX_ATTEMPTS, backoff_ms, error
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
    }
}

async fn send_once<B, R>(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &B,
) -> Result<R, Attempt>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    debug!("Sending embedding request to {}", redact(url));

    let response = request
        .send()
        .await
        .map_err(|e| Attempt::Retryable(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = format!("API error ({}): {}", status, error_message(&text));

        return Err(if is_retryable(status) {
            Attempt::Retryable(message)
        } else {
            Attempt::Fatal(message)
        });
    }

    response
        .json()
        .await
        .map_err(|e| Attempt::Fatal(format!("failed to parse response: {}", e)))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Pull a readable message out of an error body.
///
/// Understands `{"error": "..."}` and `{"error": {"message": "..."}}`;
/// anything else is returned as-is.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    match value.get("error") {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(error) => error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        None => body.to_string(),
    }
}

/// Strip the query string, which may carry an API key.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(
            error_message(r#"{"error":{"message":"bad key","type":"auth"}}"#),
            "bad key"
        );
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_redact_query() {
        assert_eq!(
            redact("https://example.test/v1/models/m:batchEmbedContents?key=secret"),
            "https://example.test/v1/models/m:batchEmbedContents"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_provider_failure() {
        let client = build_client("test", Some(1)).unwrap();
        let result: AppResult<serde_json::Value> = post_json(
            &client,
            "test",
            "http://127.0.0.1:1/embeddings",
            None,
            &serde_json::json!({}),
        )
        .await;

        match result {
            Err(AppError::ProviderFailure(message)) => assert!(message.contains("attempts")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

/// Create the HTTP client shared by every provider
pub fn create_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("condition-forecast/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

#[derive(Debug)]
pub enum ProviderError {
    Unauthorized,
    RateLimited,
    Status(u16),
    Transport(String),
    Parse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unauthorized => {
                write!(f, "Authentication failed. The API key may be invalid or expired.")
            }
            ProviderError::RateLimited => {
                write!(f, "Rate limit exceeded. Wait a few minutes and try again.")
            }
            ProviderError::Status(code) => write!(f, "Provider returned HTTP {}", code),
            ProviderError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ProviderError::Parse(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Worth another attempt: server errors and network trouble.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Status(code) => *code >= 500,
            ProviderError::Transport(_) => true,
            _ => false,
        }
    }

    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
            other => ProviderError::Status(other.as_u16()),
        })
    }
}

async fn get_once(client: &Client, url: &str, bearer: Option<&str>) -> Result<String, ProviderError> {
    let mut request = client.get(url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

    if let Some(err) = ProviderError::from_status(response.status()) {
        return Err(err);
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::Transport(e.without_url().to_string()))
}

/// GET a JSON document with retries on transient failures.
///
/// `label` names the provider in logs; the URL is never logged since it may
/// carry an API key.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    label: &str,
    url: &str,
    bearer: Option<&str>,
) -> Result<T, ProviderError> {
    let body = retry_transient(label, || get_once(client, url, bearer)).await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Run `action`, retrying only transient failures.
async fn retry_transient<T, F, Fut>(label: &str, mut action: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    // Retry strategy: exponential backoff with 3 attempts
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .take(3);

    RetryIf::start(
        retry_strategy,
        || {
            let attempt = action();
            async move {
                let result = attempt.await;
                if let Err(e) = &result {
                    log::debug!("{} request failed: {}", label, e);
                }
                result
            }
        },
        ProviderError::is_transient,
    )
    .await
}

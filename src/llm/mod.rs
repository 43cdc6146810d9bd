pub mod claude;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::{ModelConfig, Provider};
use crate::error::{AppError, Result};

/// A text-completion backend. Every call is independent: no conversation
/// state is carried between stages.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Build the client for the configured provider.
pub fn build_client(config: &ModelConfig) -> Result<Box<dyn ModelClient>> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let client: Box<dyn ModelClient> = match config.provider {
        Provider::OpenAi => Box::new(openai::OpenAiClient::new(http, config)),
        Provider::Anthropic => Box::new(claude::ClaudeClient::new(http, config)),
    };

    tracing::debug!(
        provider = ?config.provider,
        model = %config.name,
        endpoint = %config.endpoint(),
        "Model client ready"
    );

    Ok(client)
}

/// Turn a failed `send()` into the error variant callers branch on.
pub(crate) fn classify_send_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::ModelTimeout(timeout_secs)
    } else {
        AppError::Http(e)
    }
}

/// Reject non-success responses, keeping the body for diagnostics.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::ModelRateLimited(body));
    }
    Err(AppError::Model(format!("API returned {status}: {body}")))
}

/// Read and decode a successful response. The client deadline still runs
/// while the body streams in, so elapsing here is a timeout too.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    timeout_secs: u64,
) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| classify_send_error(e, timeout_secs))?;
    Ok(serde_json::from_str(&body)?)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `reply`, then hold the connection open.
    async fn serve_once(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{addr}/v1")
    }

    fn local_config(provider: Provider, base_url: String) -> (Client, ModelConfig) {
        let config = ModelConfig {
            provider,
            base_url: Some(base_url),
            api_key: "sk-test".to_string(),
            timeout_secs: 1,
            ..ModelConfig::default()
        };
        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap();
        (http, config)
    }

    // Headers arrive, the body never finishes.
    const STALLED_BODY: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: application/json\r\n\
        Content-Length: 512\r\n\r\n{\"choices\":";

    #[tokio::test]
    async fn test_stalled_body_is_timeout_for_openai() {
        let (http, config) = local_config(Provider::OpenAi, serve_once(STALLED_BODY).await);
        let client = openai::OpenAiClient::new(http, &config);

        let err = client.generate("system", "user").await.unwrap_err();
        assert!(matches!(err, AppError::ModelTimeout(1)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_stalled_body_is_timeout_for_claude() {
        let (http, config) = local_config(Provider::Anthropic, serve_once(STALLED_BODY).await);
        let client = claude::ClaudeClient::new(http, &config);

        let err = client.generate("system", "user").await.unwrap_err();
        assert!(matches!(err, AppError::ModelTimeout(1)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let reply = "HTTP/1.1 200 OK\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 8\r\n\r\nnot json";
        let (http, config) = local_config(Provider::OpenAi, serve_once(reply).await);
        let client = openai::OpenAiClient::new(http, &config);

        let err = client.generate("system", "user").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_rate_limit_status_is_classified() {
        let reply = "HTTP/1.1 429 Too Many Requests\r\nContent-Length: 4\r\n\r\nslow";
        let (http, config) = local_config(Provider::Anthropic, serve_once(reply).await);
        let client = claude::ClaudeClient::new(http, &config);

        let err = client.generate("system", "user").await.unwrap_err();
        assert!(
            matches!(err, AppError::ModelRateLimited(ref body) if body == "slow"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_join_url_handles_slashes() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            join_url("http://localhost:11434/v1", "chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_client_for_each_provider() {
        let mut config = ModelConfig {
            api_key: "sk-test".to_string(),
            ..ModelConfig::default()
        };
        assert!(build_client(&config).is_ok());

        config.provider = Provider::Anthropic;
        assert!(build_client(&config).is_ok());
    }
}

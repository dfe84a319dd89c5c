//! Model client for the Gemini `generateContent` REST API

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, UsageMetadata};
use crate::config::{default_safety_settings, GenerationConfig, SafetySetting, TIMING_CONFIG};
use crate::error::{DriveFinderError, Result};
use crate::prompt::PromptRequest;

/// Header carrying the API credential
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons meaning the service declined to answer
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

/// Configuration for the AI model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model_name: String,
    pub generation: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
    /// Whole-request timeout in seconds
    pub request_timeout: f64,
    /// Connection timeout in seconds
    pub connect_timeout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let timing = &TIMING_CONFIG.request;
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model_name: "gemini-1.5-pro".to_string(),
            generation: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
            request_timeout: timing.request_timeout,
            connect_timeout: timing.connect_timeout,
        }
    }
}

impl ModelConfig {
    /// Create a new ModelConfig with custom settings
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Load from process environment
    ///
    /// `API_KEY` is required; `DRIVEFINDER_BASE_URL` and `DRIVEFINDER_MODEL`
    /// override the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DriveFinderError::Config("API_KEY is not set".to_string()))?;

        let mut config = Self::default().with_api_key(api_key);
        if let Some(base_url) = lookup("DRIVEFINDER_BASE_URL").filter(|v| !v.is_empty()) {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("DRIVEFINDER_MODEL").filter(|v| !v.is_empty()) {
            config.model_name = model;
        }
        Ok(config)
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the whole-request timeout in seconds
    pub fn with_request_timeout(mut self, seconds: f64) -> Self {
        self.request_timeout = seconds;
        self
    }

    fn model_path(&self) -> String {
        let name = self
            .model_name
            .strip_prefix("models/")
            .unwrap_or(&self.model_name);
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), name)
    }
}

/// Text reply from the model for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageMetadata>,
    /// Total request time (seconds)
    pub total_time: Option<f64>,
}

/// Client for the hosted vision-language model
///
/// Holds only read-only state, so one client can serve any number of
/// independent submissions.
#[derive(Debug, Clone)]
pub struct ModelClient {
    config: ModelConfig,
    client: reqwest::Client,
}

impl ModelClient {
    /// Create a new ModelClient
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(DriveFinderError::Config("API key is empty".to_string()));
        }
        let request_timeout = timeout_duration("request", config.request_timeout)?;
        let connect_timeout = timeout_duration("connect", config.connect_timeout)?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| DriveFinderError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Verify the credential and model name with a metadata lookup
    pub async fn check_credentials(&self) -> Result<()> {
        let url = self.config.model_path();
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }

    /// Send one prompt and wait for the complete reply
    pub async fn generate(&self, prompt: &PromptRequest) -> Result<ModelReply> {
        let start_time = Instant::now();

        let body = GenerateContentRequest::from_prompt(
            prompt,
            self.config.generation,
            self.config.safety_settings.clone(),
        );
        let url = format!("{}:generateContent", self.config.model_path());
        debug!(
            "POST {} (attachment: {})",
            url,
            prompt.attachment.is_some()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = classify_status(status, &text);
            warn!("Model request failed: {}", err);
            return Err(err);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            DriveFinderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let mut reply = interpret_response(parsed)?;
        reply.total_time = Some(start_time.elapsed().as_secs_f64());

        info!(
            "Model replied in {:.3}s ({} chars)",
            reply.total_time.unwrap_or_default(),
            reply.text.len()
        );
        Ok(reply)
    }
}

fn timeout_duration(name: &str, seconds: f64) -> Result<Duration> {
    if !(seconds > 0.0) {
        return Err(DriveFinderError::Config(format!(
            "{} timeout must be positive, got {}",
            name, seconds
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        DriveFinderError::Config(format!("Invalid {} timeout {}: {}", name, seconds, e))
    })
}

fn transport_error(e: reqwest::Error) -> DriveFinderError {
    let message = if e.is_timeout() {
        "Request timeout - the model took too long to respond".to_string()
    } else if e.is_connect() {
        format!("Connection error - unable to reach the model endpoint: {}", e)
    } else {
        format!("Network error: {}", e)
    };
    DriveFinderError::Transport(message)
}

/// Map a non-success HTTP status and body to an error
pub fn classify_status(status: StatusCode, body: &str) -> DriveFinderError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    let auth_failure = envelope
        .as_ref()
        .map(|e| e.error.is_auth_failure())
        .unwrap_or(false);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DriveFinderError::Auth(message),
        _ if auth_failure => DriveFinderError::Auth(message),
        _ => DriveFinderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract the reply text, or report why there is none
pub fn interpret_response(response: GenerateContentResponse) -> Result<ModelReply> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(DriveFinderError::ContentBlocked(format!(
            "prompt blocked ({})",
            reason
        )));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        DriveFinderError::InvalidResponse("Response contained no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(DriveFinderError::ContentBlocked(format!(
                "response withheld ({})",
                reason
            )));
        }
        return Err(DriveFinderError::InvalidResponse(format!(
            "Model returned empty content (finish reason: {})",
            reason
        )));
    }

    Ok(ModelReply {
        text,
        finish_reason: candidate.finish_reason,
        usage: response.usage_metadata,
        total_time: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(
            config.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.model_name, "gemini-1.5-pro");
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.safety_settings.len(), 4);
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("http://custom:8080/", "models/custom-model")
            .with_api_key("test-key")
            .with_request_timeout(5.0);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.request_timeout, 5.0);
        assert_eq!(config.model_path(), "http://custom:8080/models/custom-model");
    }

    #[test]
    fn test_from_env_requires_api_key() {
        let empty: HashMap<&str, &str> = HashMap::new();
        let err = ModelConfig::from_lookup(|k| empty.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, DriveFinderError::Config(_)));

        let blank = HashMap::from([("API_KEY", "  ")]);
        let err = ModelConfig::from_lookup(|k| blank.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, DriveFinderError::Config(_)));
    }

    #[test]
    fn test_from_env_overrides() {
        let vars = HashMap::from([
            ("API_KEY", "secret"),
            ("DRIVEFINDER_MODEL", "gemini-1.5-flash"),
        ]);
        let config = ModelConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model_name, "gemini-1.5-flash");
        assert_eq!(config.base_url, ModelConfig::default().base_url);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = ModelConfig::default().with_api_key("secret");
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("api_key").is_none());
    }

    #[test]
    fn test_client_rejects_empty_key() {
        let err = ModelClient::new(ModelConfig::default()).unwrap_err();
        assert!(matches!(err, DriveFinderError::Config(_)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            DriveFinderError::Auth(_)
        ));

        let invalid_key = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{ "reason": "API_KEY_INVALID" }]
            }
        })
        .to_string();
        match classify_status(StatusCode::BAD_REQUEST, &invalid_key) {
            DriveFinderError::Auth(message) => assert!(message.starts_with("API key not valid")),
            other => panic!("unexpected error: {other:?}"),
        }

        match classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            DriveFinderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_joins_text_parts() {
        let reply = interpret_response(parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "HONDA JAZZ\n" }, { "text": "> Reliable" }] },
                "finishReason": "STOP"
            }]
        })))
        .unwrap();

        assert_eq!(reply.text, "HONDA JAZZ\n> Reliable");
        assert_eq!(reply.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_interpret_blocked_prompt() {
        let err = interpret_response(parse(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .unwrap_err();
        assert!(matches!(err, DriveFinderError::ContentBlocked(_)));
    }

    #[test]
    fn test_interpret_safety_finish_without_text() {
        let err = interpret_response(parse(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .unwrap_err();
        assert!(matches!(err, DriveFinderError::ContentBlocked(_)));
    }

    #[test]
    fn test_interpret_no_candidates() {
        let err = interpret_response(parse(json!({ "candidates": [] }))).unwrap_err();
        assert!(matches!(err, DriveFinderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ModelConfig::new(format!("http://127.0.0.1:{}/v1beta", port), "gemini-1.5-pro")
            .with_api_key("test-key");
        let client = ModelClient::new(config).unwrap();
        let prompt = PromptRequest {
            text: "hello".to_string(),
            attachment: None,
        };

        let err = client.generate(&prompt).await.unwrap_err();
        assert!(matches!(err, DriveFinderError::Transport(_)), "{err:?}");
    }

    #[test]
    fn test_unusable_timeouts_are_config_errors() {
        for seconds in [f64::INFINITY, f64::NAN, 1e30, 0.0, -1.0] {
            let config = ModelConfig::default()
                .with_api_key("k")
                .with_request_timeout(seconds);
            let err = ModelClient::new(config).unwrap_err();
            assert!(matches!(err, DriveFinderError::Config(_)), "{seconds}: {err:?}");
        }

        let mut config = ModelConfig::default().with_api_key("k");
        config.connect_timeout = 1e30;
        assert!(matches!(
            ModelClient::new(config),
            Err(DriveFinderError::Config(_))
        ));
    }

    #[test]
    fn test_config_round_trips_without_api_key() {
        let config = ModelConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        let restored: ModelConfig = serde_json::from_str(&json).unwrap();

        assert!(restored.api_key.is_empty());
        assert_eq!(restored.model_name, config.model_name);
        assert_eq!(restored.safety_settings, config.safety_settings);
    }

    #[test]
    fn test_unauthenticated_status_is_auth() {
        let body = json!({
            "error": { "code": 400, "message": "bad credential", "status": "UNAUTHENTICATED" }
        })
        .to_string();
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, &body),
            DriveFinderError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "API_KEY_INVALID"),
            DriveFinderError::Api { status: 400, .. }
        ));
    }

    /// Read one HTTP request: headers plus a `content-length` body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single request with a canned response; yields the raw request
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (base_url, handle)
    }

    fn client_for(base_url: String) -> ModelClient {
        ModelClient::new(ModelConfig::new(base_url, "gemini-1.5-pro").with_api_key("test-key"))
            .unwrap()
    }

    fn sample_prompt() -> PromptRequest {
        PromptRequest {
            text: "Use Case: city car".to_string(),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_generate_sends_key_and_returns_text() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "TOYOTA YARIS\n> Frugal" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 6, "totalTokenCount": 18 }
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let reply = client_for(base_url).generate(&sample_prompt()).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(reply.text, "TOYOTA YARIS\n> Frugal");
        assert_eq!(reply.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(reply.usage.map(|u| u.total_token_count), Some(18));
        assert!(reply.total_time.is_some());

        assert!(
            request.starts_with("POST /v1beta/models/gemini-1.5-pro:generateContent HTTP/1.1\r\n"),
            "{request}"
        );
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("\"generationConfig\""));
        assert!(request.contains("\"safetySettings\""));
        assert!(request.contains("Use Case: city car"));
    }

    #[tokio::test]
    async fn test_generate_forbidden_is_auth() {
        let body = json!({
            "error": { "code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED" }
        })
        .to_string();
        let (base_url, server) = serve_once("403 Forbidden", body).await;

        let err = client_for(base_url).generate(&sample_prompt()).await.unwrap_err();
        server.await.unwrap();

        match err {
            DriveFinderError::Auth(message) => assert_eq!(message, "Permission denied"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_block_reason_is_content_blocked() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let err = client_for(base_url).generate(&sample_prompt()).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, DriveFinderError::ContentBlocked(_)), "{err:?}");
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_check_credentials_unauthorized_is_auth() {
        let (base_url, server) = serve_once("401 Unauthorized", String::new()).await;

        let err = client_for(base_url).check_credentials().await.unwrap_err();
        let request = server.await.unwrap();

        assert!(matches!(err, DriveFinderError::Auth(_)), "{err:?}");
        assert!(
            request.starts_with("GET /v1beta/models/gemini-1.5-pro HTTP/1.1\r\n"),
            "{request}"
        );
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
    }
}

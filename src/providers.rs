use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::logging::LogCategory;
use crate::{log_debug, log_warning};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Backends a translation can be sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderType {
    pub const ALL: [ProviderType; 3] = [
        ProviderType::OpenAi,
        ProviderType::Anthropic,
        ProviderType::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAi => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "anthropic" => Ok(ProviderType::Anthropic),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(anyhow!("Unknown provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// One completion request. Tools are never offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A request carrying a single user message
    pub fn single(system_prompt: &str, user_message: String) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: user_message,
            }],
        }
    }
}

/// Text-completion transport used by the translator
#[async_trait]
pub trait LanguageModel: Send {
    async fn complete(&mut self, request: &ChatRequest) -> Result<String>;
}

/// Common interface for all AI providers
#[async_trait]
pub trait AIProvider: Send + Sync {
    async fn generate_response(&self, request: &ChatRequest) -> Result<String>;

    fn get_provider_type(&self) -> ProviderType;

    fn get_model(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Stops calling a provider after repeated failures until it has had time to recover
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitBreakerState,
    failure_count: u32,
    failure_threshold: u32,
    recovery_timeout: Duration,
    last_failure_time: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            state: CircuitBreakerState::Closed,
            failure_count: 0,
            failure_threshold,
            recovery_timeout,
            last_failure_time: None,
        }
    }

    pub fn can_execute(&mut self) -> bool {
        match self.state {
            CircuitBreakerState::Closed | CircuitBreakerState::HalfOpen => true,
            CircuitBreakerState::Open => match self.last_failure_time {
                Some(last_failure) if last_failure.elapsed() >= self.recovery_timeout => {
                    self.state = CircuitBreakerState::HalfOpen;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.state = CircuitBreakerState::Closed;
        self.last_failure_time = None;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_time = Some(Instant::now());

        if self.failure_count >= self.failure_threshold
            || self.state == CircuitBreakerState::HalfOpen
        {
            self.state = CircuitBreakerState::Open;
        }
    }

    pub fn get_state(&self) -> CircuitBreakerState {
        self.state.clone()
    }
}

/// Owns the configured providers and routes each request through the fallback chain
pub struct ProviderManager {
    providers: Vec<Box<dyn AIProvider>>,
    fallback_chain: Vec<ProviderType>,
    retry_limits: HashMap<ProviderType, u32>,
    circuit_breakers: HashMap<ProviderType, CircuitBreaker>,
    timeout: Duration,
}

impl ProviderManager {
    pub fn new(timeout: Duration) -> Self {
        let mut retry_limits = HashMap::new();
        retry_limits.insert(ProviderType::Ollama, 2);
        retry_limits.insert(ProviderType::OpenAi, 1);
        retry_limits.insert(ProviderType::Anthropic, 1);

        let mut circuit_breakers = HashMap::new();
        circuit_breakers.insert(
            ProviderType::Ollama,
            CircuitBreaker::new(5, Duration::from_secs(30)),
        );
        for cloud in [ProviderType::OpenAi, ProviderType::Anthropic] {
            circuit_breakers.insert(cloud, CircuitBreaker::new(3, Duration::from_secs(15)));
        }

        Self {
            providers: Vec::new(),
            fallback_chain: ProviderType::ALL.to_vec(),
            retry_limits,
            circuit_breakers,
            timeout,
        }
    }

    pub fn add_provider(&mut self, provider: Box<dyn AIProvider>) {
        self.providers.push(provider);
    }

    /// Move `preferred` to the front of the fallback chain
    pub fn switch_provider_preference(&mut self, preferred: ProviderType) {
        self.fallback_chain.retain(|t| *t != preferred);
        self.fallback_chain.insert(0, preferred);
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Name and model of the first provider in the fallback chain
    pub fn active_provider(&self) -> Option<(ProviderType, &str)> {
        self.fallback_chain
            .iter()
            .find_map(|t| self.get_provider_by_type(*t))
            .map(|p| (p.get_provider_type(), p.get_model()))
    }

    pub fn get_provider_by_type(&self, provider_type: ProviderType) -> Option<&dyn AIProvider> {
        self.providers
            .iter()
            .find(|p| p.get_provider_type() == provider_type)
            .map(|p| p.as_ref())
    }

    /// Send `request` to the first provider that answers
    pub async fn get_response(&mut self, request: &ChatRequest) -> Result<String> {
        let mut last_error = None;
        let fallback_chain = self.fallback_chain.clone();

        for provider_type in fallback_chain {
            if self.get_provider_by_type(provider_type).is_none() {
                continue;
            }

            if let Some(circuit_breaker) = self.circuit_breakers.get_mut(&provider_type) {
                if !circuit_breaker.can_execute() {
                    log_warning!(
                        LogCategory::Provider,
                        format!("Skipping {}: circuit open", provider_type)
                    );
                    continue;
                }
            }

            let retry_limit = (*self.retry_limits.get(&provider_type).unwrap_or(&1)).max(1);

            for attempt in 0..retry_limit {
                let started = Instant::now();
                let result = match self.get_provider_by_type(provider_type) {
                    Some(provider) => {
                        tokio::time::timeout(self.timeout, provider.generate_response(request))
                            .await
                    }
                    None => break,
                };
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(Ok(response)) => {
                        record_operation(provider_type, elapsed_ms, true);
                        if let Some(circuit_breaker) = self.circuit_breakers.get_mut(&provider_type) {
                            circuit_breaker.record_success();
                        }
                        return Ok(response);
                    }
                    Ok(Err(e)) => {
                        record_operation(provider_type, elapsed_ms, false);
                        log_debug!(LogCategory::Provider, format!("{} error: {}", provider_type, e));
                        last_error = Some(e);

                        if attempt + 1 < retry_limit {
                            let backoff = Duration::from_millis(100 * (attempt as u64 + 1));
                            tokio::time::sleep(backoff).await;
                        }
                    }
                    Err(_) => {
                        record_operation(provider_type, elapsed_ms, false);
                        last_error = Some(anyhow!(
                            "Provider {} timed out after {}s",
                            provider_type,
                            self.timeout.as_secs()
                        ));
                        break;
                    }
                }
            }

            if let Some(circuit_breaker) = self.circuit_breakers.get_mut(&provider_type) {
                circuit_breaker.record_failure();
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("No providers available")))
    }
}

#[async_trait]
impl LanguageModel for ProviderManager {
    async fn complete(&mut self, request: &ChatRequest) -> Result<String> {
        self.get_response(request).await
    }
}

fn record_operation(provider_type: ProviderType, duration_ms: u64, success: bool) {
    if let Ok(logger) = crate::logging::get_logger() {
        if let Ok(guard) = logger.lock() {
            let _ = guard.log_provider_operation(provider_type.as_str(), "complete", duration_ms, success);
        }
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn map_send_error(provider: &str, base_url: &str, timeout: Duration, e: reqwest::Error) -> anyhow::Error {
    if e.is_timeout() {
        anyhow!("Request to {} timed out after {:?}", provider, timeout)
    } else if e.is_connect() {
        anyhow!("Failed to connect to {} at {}: {}", provider, base_url, e)
    } else {
        anyhow!("Request to {} failed: {}", provider, e)
    }
}

async fn check_status(provider: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(match status.as_u16() {
            401 | 403 => anyhow!("{} authentication failed ({}): check your API key", provider, status),
            429 => anyhow!("{} rate limit exceeded ({}): {}", provider, status, body),
            _ => anyhow!("{} returned error {}: {}", provider, status, body),
        });
    }

    response
        .json()
        .await
        .map_err(|e| anyhow!("Failed to parse {} response: {}", provider, e))
}

fn chat_messages(request: &ChatRequest, include_system: bool) -> Vec<Value> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if include_system && !request.system_prompt.is_empty() {
        messages.push(json!({"role": "system", "content": request.system_prompt}));
    }
    messages.extend(
        request
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content})),
    );
    messages
}

pub fn openai_body(model: &str, request: &ChatRequest) -> Value {
    json!({
        "model": model,
        "messages": chat_messages(request, true),
        "temperature": 0.2
    })
}

pub fn parse_openai_response(json: &Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Unexpected response format from OpenAI"))
}

pub fn anthropic_body(model: &str, request: &ChatRequest) -> Value {
    let mut body = json!({
        "model": model,
        "max_tokens": 1024,
        "messages": chat_messages(request, false)
    });
    if !request.system_prompt.is_empty() {
        body["system"] = json!(request.system_prompt);
    }
    body
}

pub fn parse_anthropic_response(json: &Value) -> Result<String> {
    let blocks = json["content"]
        .as_array()
        .ok_or_else(|| anyhow!("No content in Anthropic response"))?;

    Ok(blocks
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}

pub fn ollama_body(model: &str, request: &ChatRequest) -> Value {
    json!({
        "model": model,
        "messages": chat_messages(request, true),
        "stream": false,
        "options": {
            "temperature": 0.3
        }
    })
}

pub fn parse_ollama_response(json: &Value) -> Result<String> {
    json["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No message content in Ollama response"))
}

/// Local Ollama server through `/api/chat`
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl AIProvider for OllamaProvider {
    async fn generate_response(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_body(&self.model, request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!(
                        "Failed to connect to Ollama at {}: {}. Please ensure Ollama is running with: ollama serve",
                        self.base_url,
                        e
                    )
                } else {
                    map_send_error("Ollama", &self.base_url, self.timeout, e)
                }
            })?;

        if response.status().as_u16() == 404 {
            return Err(anyhow!(
                "Ollama model '{}' is not available. Try: ollama pull {}",
                self.model,
                self.model
            ));
        }

        let json = check_status("Ollama", response).await?;
        parse_ollama_response(&json)
    }

    fn get_provider_type(&self) -> ProviderType {
        ProviderType::Ollama
    }

    fn get_model(&self) -> &str {
        &self.model
    }
}

/// OpenAI chat completions
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl AIProvider for OpenAiProvider {
    async fn generate_response(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&openai_body(&self.model, request))
            .send()
            .await
            .map_err(|e| map_send_error("OpenAI", &self.base_url, self.timeout, e))?;

        let json = check_status("OpenAI", response).await?;
        parse_openai_response(&json)
    }

    fn get_provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
    }

    fn get_model(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages API
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn generate_response(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/v1/messages", ANTHROPIC_URL);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&anthropic_body(&self.model, request))
            .send()
            .await
            .map_err(|e| map_send_error("Anthropic", ANTHROPIC_URL, self.timeout, e))?;

        let json = check_status("Anthropic", response).await?;
        parse_anthropic_response(&json)
    }

    fn get_provider_type(&self) -> ProviderType {
        ProviderType::Anthropic
    }

    fn get_model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedProvider {
        provider_type: ProviderType,
        fail: bool,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        fn boxed(provider_type: ProviderType, fail: bool) -> (Box<dyn AIProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = ScriptedProvider {
                provider_type,
                fail,
                delay: None,
                calls: calls.clone(),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl AIProvider for ScriptedProvider {
        async fn generate_response(&self, _request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                Err(anyhow!("{} unavailable", self.provider_type))
            } else {
                Ok(format!("ls # from {}", self.provider_type))
            }
        }

        fn get_provider_type(&self) -> ProviderType {
            self.provider_type
        }

        fn get_model(&self) -> &str {
            "test-model"
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::single("You are a shell command translator.", "list files".to_string())
    }

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::OpenAi);
        assert_eq!(" ollama ".parse::<ProviderType>().unwrap(), ProviderType::Ollama);
        assert!("gemini".parse::<ProviderType>().is_err());
        assert_eq!(serde_json::to_string(&ProviderType::OpenAi).unwrap(), "\"openai\"");
    }

    #[test]
    fn test_circuit_breaker_opens_at_threshold() {
        let mut cb = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(cb.can_execute());

        cb.record_failure();
        cb.record_failure();
        assert!(cb.can_execute());

        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitBreakerState::Open);
        assert!(!cb.can_execute());
    }

    #[test]
    fn test_circuit_breaker_half_opens_after_recovery() {
        let mut cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitBreakerState::Open);

        assert!(cb.can_execute());
        assert_eq!(cb.get_state(), CircuitBreakerState::HalfOpen);

        // one failure while probing reopens it
        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitBreakerState::Open);

        cb.record_success();
        assert_eq!(cb.get_state(), CircuitBreakerState::Closed);
    }

    #[test]
    fn test_switch_preference_reorders_chain() {
        let mut manager = ProviderManager::new(Duration::from_secs(1));
        manager.switch_provider_preference(ProviderType::Ollama);
        assert_eq!(manager.fallback_chain[0], ProviderType::Ollama);
        assert_eq!(manager.fallback_chain.len(), 3);
    }

    #[tokio::test]
    async fn test_preferred_provider_answers_first() {
        let mut manager = ProviderManager::new(Duration::from_secs(5));
        let (openai, openai_calls) = ScriptedProvider::boxed(ProviderType::OpenAi, false);
        let (ollama, ollama_calls) = ScriptedProvider::boxed(ProviderType::Ollama, false);
        manager.add_provider(openai);
        manager.add_provider(ollama);
        manager.switch_provider_preference(ProviderType::Ollama);

        let reply = manager.complete(&request()).await.unwrap();
        assert_eq!(reply, "ls # from ollama");
        assert_eq!(ollama_calls.load(Ordering::SeqCst), 1);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.active_provider(), Some((ProviderType::Ollama, "test-model")));
    }

    #[tokio::test]
    async fn test_falls_back_after_retries() {
        let mut manager = ProviderManager::new(Duration::from_secs(5));
        let (ollama, ollama_calls) = ScriptedProvider::boxed(ProviderType::Ollama, true);
        let (openai, _) = ScriptedProvider::boxed(ProviderType::OpenAi, false);
        manager.add_provider(ollama);
        manager.add_provider(openai);
        manager.switch_provider_preference(ProviderType::Ollama);

        let reply = manager.get_response(&request()).await.unwrap();
        assert_eq!(reply, "ls # from openai");
        assert_eq!(ollama_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_failing_returns_last_error() {
        let mut manager = ProviderManager::new(Duration::from_secs(5));
        let (openai, _) = ScriptedProvider::boxed(ProviderType::OpenAi, true);
        manager.add_provider(openai);

        let err = manager.get_response(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "openai unavailable");
    }

    #[tokio::test]
    async fn test_no_providers() {
        let mut manager = ProviderManager::new(Duration::from_secs(5));
        assert!(!manager.has_providers());
        let err = manager.get_response(&request()).await.unwrap_err();
        assert!(err.to_string().contains("No providers available"));
    }

    #[tokio::test]
    async fn test_open_circuit_skips_provider() {
        let mut manager = ProviderManager::new(Duration::from_secs(5));
        let (openai, calls) = ScriptedProvider::boxed(ProviderType::OpenAi, true);
        manager.add_provider(openai);

        for _ in 0..3 {
            assert!(manager.get_response(&request()).await.is_err());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // breaker is open now; the provider is not called again
        assert!(manager.get_response(&request()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            manager.circuit_breakers[&ProviderType::OpenAi].get_state(),
            CircuitBreakerState::Open
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut manager = ProviderManager::new(Duration::from_millis(50));
        let calls = Arc::new(AtomicUsize::new(0));
        manager.add_provider(Box::new(ScriptedProvider {
            provider_type: ProviderType::Ollama,
            fail: false,
            delay: Some(Duration::from_secs(5)),
            calls: calls.clone(),
        }));

        let err = manager.get_response(&request()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        // no retry after a timeout
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_openai_request_and_response() {
        let body = openai_body("gpt-4o-mini", &request());
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "list files");
        assert!(body.get("tools").is_none());

        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "ls -la"}}]});
        assert_eq!(parse_openai_response(&reply).unwrap(), "ls -la");
        assert!(parse_openai_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_anthropic_request_and_response() {
        let body = anthropic_body("claude-3-5-sonnet-latest", &request());
        assert_eq!(body["system"], "You are a shell command translator.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");

        let reply = json!({
            "content": [
                {"type": "text", "text": "# listing\n"},
                {"type": "text", "text": "ls"}
            ]
        });
        assert_eq!(parse_anthropic_response(&reply).unwrap(), "# listing\nls");
    }

    #[test]
    fn test_ollama_request_and_response() {
        let body = ollama_body("llama3", &request());
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");

        let reply = json!({"message": {"role": "assistant", "content": "pwd"}, "done": true});
        assert_eq!(parse_ollama_response(&reply).unwrap(), "pwd");
        assert!(parse_ollama_response(&json!({"response": "pwd"})).is_err());
    }

    #[test]
    fn test_provider_construction_trims_urls() {
        let provider = OllamaProvider::new(
            "http://localhost:11434/".to_string(),
            "llama3".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.get_model(), "llama3");
        assert_eq!(provider.get_provider_type(), ProviderType::Ollama);
    }
}

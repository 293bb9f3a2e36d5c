//! OpenAI-compatible chat completions provider.
//!
//! This module provides the [`ChatCompletionsProvider`] which implements the
//! [`AIProvider`] trait for any endpoint speaking the chat completions
//! protocol (OpenAI, vLLM, hosted gateways).
//!
//! The endpoint, credential and auth header are normally resolved from the
//! environment with [`ChatCompletionsProvider::from_env`]; see
//! [`resolve_endpoint`] for the exact lookup order.

use super::AIProvider;
use crate::types::{ColumnStatsEntry, Decision};
use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default model when neither the environment nor the caller names one.
const DEFAULT_MODEL: &str = "qwen3-32b";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default temperature for model responses (low for stable decisions).
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Path appended to a base URL.
const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";

const API_KEY_VARS: [&str; 3] = ["OPENAI_API_KEY", "LLM_API_KEY", "HUAWEI_LLM_API_KEY"];
const ENDPOINT_VARS: [&str; 2] = ["FULL_CHAT_COMPLETIONS_URL", "HUAWEI_LLM_ENDPOINT"];
const BASE_URL_VARS: [&str; 2] = ["OPENAI_BASE_URL", "LLM_API_BASE"];
const AUTH_HEADER_VAR: &str = "LLM_AUTH_HEADER";
const MODEL_VAR: &str = "LLM_MODEL_NAME";

const SYSTEM_PROMPT: &str = "You are an expert in data preprocessing. \
Given the statistics of a single column, respond ONLY with a JSON object with the keys: \
imputation (one of: mean, median, knn, drop, leave, most_frequent), \
encoding (one of: onehot, frequency, target, cyclical, none), \
scaling (one of: standard, minmax, none), \
reason (a short explanation).";

/// Greedy span from the first `{` to the last `}`.
static JSON_OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex"));

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

/// How the credential is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `X-Auth-Token: <key>`
    XAuthToken,
}

impl AuthHeader {
    /// Interpret the `LLM_AUTH_HEADER` setting. Anything other than
    /// `x-auth-token` (any case) means bearer auth.
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("x-auth-token") {
            Self::XAuthToken
        } else {
            Self::Bearer
        }
    }
}

/// Credential and URL found in the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub api_key: String,
    pub url: String,
    pub auth_header: AuthHeader,
    /// Model named by the environment, if any.
    pub model: Option<String>,
}

/// Resolve the remote endpoint through `lookup` (normally `std::env::var`).
///
/// Empty values count as unset. Returns `None` when there is no credential,
/// or when neither an explicit endpoint nor a base URL is configured.
pub fn resolve_endpoint(lookup: impl Fn(&str) -> Option<String>) -> Option<ResolvedEndpoint> {
    let first = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| lookup(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    };

    let api_key = first(&API_KEY_VARS)?;

    let url = match first(&ENDPOINT_VARS) {
        Some(endpoint) => endpoint,
        None => {
            let base = first(&BASE_URL_VARS)?;
            let base = base.trim_end_matches('/');
            if base.ends_with(CHAT_COMPLETIONS_SUFFIX) {
                base.to_string()
            } else {
                format!("{}{}", base, CHAT_COMPLETIONS_SUFFIX)
            }
        }
    };

    let auth_header = first(&[AUTH_HEADER_VAR])
        .map(|v| AuthHeader::from_setting(&v))
        .unwrap_or_default();

    Some(ResolvedEndpoint {
        api_key,
        url,
        auth_header,
        model: first(&[MODEL_VAR]),
    })
}

/// Configuration for the chat completions provider.
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    /// Default model, overridden per call by a model hint.
    pub model: String,
    /// Temperature for response generation.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub auth_header: AuthHeader,
}

impl Default for ChatCompletionsConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_header: AuthHeader::Bearer,
        }
    }
}

impl ChatCompletionsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ChatCompletionsConfigBuilder {
        ChatCompletionsConfigBuilder::default()
    }
}

/// Builder for [`ChatCompletionsConfig`].
#[derive(Default)]
pub struct ChatCompletionsConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    auth_header: Option<AuthHeader>,
}

impl ChatCompletionsConfigBuilder {
    /// Set the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn auth_header(mut self, auth_header: AuthHeader) -> Self {
        self.auth_header = Some(auth_header);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ChatCompletionsConfig {
        ChatCompletionsConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            auth_header: self.auth_header.unwrap_or_default(),
        }
    }
}

/// Provider for any OpenAI-compatible chat completions endpoint.
///
/// Each call sends one request with the configured timeout and no retries.
///
/// # Example
///
/// ```rust,ignore
/// use autoprep::ai::{AuthHeader, ChatCompletionsConfig, ChatCompletionsProvider};
///
/// // From OPENAI_API_KEY / OPENAI_BASE_URL and friends
/// let provider = ChatCompletionsProvider::from_env()?;
///
/// // Explicit endpoint
/// let config = ChatCompletionsConfig::builder()
///     .model("gpt-4o-mini")
///     .auth_header(AuthHeader::XAuthToken)
///     .build();
/// let provider = ChatCompletionsProvider::with_config("key", "https://gw.example.com/v1/chat/completions", config)?;
/// ```
pub struct ChatCompletionsProvider {
    api_key: String,
    url: String,
    config: ChatCompletionsConfig,
    client: Client,
}

impl ChatCompletionsProvider {
    /// Create a provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, url, ChatCompletionsConfig::default())
    }

    /// Create a provider with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(
        api_key: impl Into<String>,
        url: impl Into<String>,
        config: ChatCompletionsConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_key: api_key.into(),
            url: url.into(),
            config,
            client,
        })
    }

    /// Build a provider from the process environment.
    ///
    /// Returns `Ok(None)` when remote mode is not configured.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(endpoint) = resolve_endpoint(|name| std::env::var(name).ok()) else {
            debug!("No remote advisor configured in the environment");
            return Ok(None);
        };
        Self::from_endpoint(endpoint).map(Some)
    }

    /// Build a provider from an already resolved endpoint.
    pub fn from_endpoint(endpoint: ResolvedEndpoint) -> Result<Self> {
        let mut builder = ChatCompletionsConfig::builder().auth_header(endpoint.auth_header);
        if let Some(model) = endpoint.model {
            builder = builder.model(model);
        }
        Self::with_config(endpoint.api_key, endpoint.url, builder.build())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_user_prompt(column: &ColumnStatsEntry) -> Result<String> {
        let stats = serde_json::to_string(column)?;
        Ok(format!(
            "Here are the statistics of one column. Propose the best strategy.\n{}",
            stats
        ))
    }

    fn call_api(&self, model: &str, user_prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                Message {
                    role: "user".to_string(),
                    content: Some(user_prompt),
                },
            ],
            temperature: self.config.temperature,
        };

        let mut http = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        http = match self.config.auth_header {
            AuthHeader::Bearer => http.header("Authorization", format!("Bearer {}", self.api_key)),
            AuthHeader::XAuthToken => http.header("X-Auth-Token", &self.api_key),
        };

        let response = http.json(&request).send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Chat completions API error {}: {}",
                response.status(),
                response.text()?
            ));
        }

        let result: ChatResponse = response.json()?;
        extract_content(result)
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| anyhow!("No response content from chat completions API"))
}

/// Parse a model reply into a [`Decision`].
///
/// The whole reply is tried as JSON first. Otherwise the widest `{...}` span
/// is tried, then each `{` in turn until a complete object parses. The result
/// must be a JSON object.
pub fn parse_decision_payload(content: &str) -> Result<Decision> {
    let value = serde_json::from_str::<serde_json::Value>(content.trim())
        .ok()
        .or_else(|| {
            JSON_OBJECT_SPAN
                .find(content)
                .and_then(|m| serde_json::from_str(m.as_str()).ok())
        })
        .or_else(|| first_embedded_object(content))
        .ok_or_else(|| anyhow!("No JSON object in advisor reply"))?;

    Decision::from_json_value(&value)
        .ok_or_else(|| anyhow!("Advisor reply is JSON but not an object: {}", value))
}

fn first_embedded_object(content: &str) -> Option<serde_json::Value> {
    content
        .match_indices('{')
        .filter_map(|(start, _)| {
            serde_json::Deserializer::from_str(&content[start..])
                .into_iter::<serde_json::Value>()
                .next()
                .and_then(|parsed| parsed.ok())
        })
        .find(|value| value.is_object())
}

impl AIProvider for ChatCompletionsProvider {
    fn recommend_strategy(
        &self,
        column: &ColumnStatsEntry,
        model_hint: Option<&str>,
    ) -> Result<Decision> {
        let model = model_hint.unwrap_or(&self.config.model);
        let prompt = Self::build_user_prompt(column)?;
        let content = self.call_api(model, prompt)?;

        parse_decision_payload(&content).inspect_err(|e| {
            warn!("Unusable advisor reply for '{}': {}", column.name, e);
        })
    }

    fn name(&self) -> &str {
        "ChatCompletions"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

// ============================================================================
// Tests
// ============================================================================

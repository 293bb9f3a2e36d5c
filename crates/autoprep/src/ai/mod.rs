//! AI module for LLM-backed strategy recommendations.
//!
//! # Feature Flag
//!
//! The concrete provider needs the `ai` feature flag (on by default). The
//! [`AIProvider`] trait is always available for custom implementations.
//!
//! ```toml
//! # Enable the remote advisor (default)
//! autoprep = { version = "0.1", features = ["ai"] }
//!
//! # Heuristic advisor only, no HTTP client
//! autoprep = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - [`AIProvider`] - the interface the remote advisor calls
//! - [`ChatCompletionsProvider`] - any OpenAI-compatible chat completions
//!   endpoint (requires `ai` feature), configured explicitly or from the
//!   environment

// Provider trait is always available (for custom implementations)
mod provider;
pub use provider::AIProvider;

// Concrete providers require the "ai" feature
#[cfg(feature = "ai")]
mod chat_completions;

#[cfg(feature = "ai")]
pub use chat_completions::{
    AuthHeader, ChatCompletionsConfig, ChatCompletionsConfigBuilder, ChatCompletionsProvider,
    ResolvedEndpoint, parse_decision_payload, resolve_endpoint,
};

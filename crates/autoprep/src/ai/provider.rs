//! AI provider trait for abstracting LLM interactions.
//!
//! This module defines the [`AIProvider`] trait so the advisor can talk to
//! any text-generation backend without changing the pipeline.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/ai/`
//! 2. Implement the [`AIProvider`] trait for your provider struct
//! 3. Export the provider in `src/ai/mod.rs`
//!
//! # Example
//!
//! ```rust,ignore
//! use autoprep::ai::ChatCompletionsProvider;
//! use autoprep::Pipeline;
//! use std::sync::Arc;
//!
//! let provider = ChatCompletionsProvider::new("api-key", "https://llm.example.com/v1/chat/completions")?;
//! let pipeline = Pipeline::builder()
//!     .ai_provider(Arc::new(provider))
//!     .build()?;
//! ```

use crate::types::{ColumnStatsEntry, Decision};
use anyhow::Result;

/// Trait for AI providers that recommend a cleaning strategy for a column.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow usage across threads.
///
/// # Error Handling
///
/// Implementations report every failure (network, timeout, unusable
/// payload) as an error and never substitute a decision of their own. The
/// advisor wrapping the provider owns the fallback.
pub trait AIProvider: Send + Sync {
    /// Recommend imputation, encoding and scaling for one column.
    ///
    /// `model_hint` overrides the provider's configured model for this call.
    fn recommend_strategy(
        &self,
        column: &ColumnStatsEntry,
        model_hint: Option<&str>,
    ) -> Result<Decision>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}

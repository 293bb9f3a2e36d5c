//! Strategy selection for individual columns.
//!
//! Two advisors share the [`StrategyAdvisor`] contract: the deterministic
//! [`HeuristicAdvisor`] and the [`RemoteAdvisor`], which asks an
//! [`AIProvider`] and falls back to the heuristic on any failure. Which one a
//! pipeline uses is decided once, when it is built, via [`select_advisor`].

mod ai_engine;
mod rule_engine;

pub use ai_engine::RemoteAdvisor;
pub use rule_engine::HeuristicAdvisor;

use crate::ai::AIProvider;
use crate::types::{ColumnStatsEntry, Decision};
use std::sync::Arc;

/// Trait for column strategy advisors.
///
/// `advise` is infallible: implementations recover from their own failures
/// and always return a fully populated [`Decision`].
pub trait StrategyAdvisor: Send + Sync {
    /// Recommend a strategy for one column from its statistics.
    ///
    /// `model_hint` is passed through to remote services and ignored otherwise.
    fn advise(&self, column: &ColumnStatsEntry, model_hint: Option<&str>) -> Decision;

    /// Advisor name for logging.
    fn name(&self) -> &str;
}

/// Remote advisor when a provider is available, heuristic otherwise.
pub fn select_advisor(provider: Option<Arc<dyn AIProvider>>) -> Arc<dyn StrategyAdvisor> {
    match provider {
        Some(provider) => Arc::new(RemoteAdvisor::new(provider)),
        None => Arc::new(HeuristicAdvisor::new()),
    }
}

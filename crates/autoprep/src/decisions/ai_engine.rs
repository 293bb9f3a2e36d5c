//! Remote strategy advisor backed by an LLM.

use super::{HeuristicAdvisor, StrategyAdvisor};
use crate::ai::AIProvider;
use crate::types::{ColumnStatsEntry, Decision};
use std::sync::Arc;
use tracing::{debug, warn};

/// Advisor that asks an [`AIProvider`] for each column.
///
/// Any provider error (network, timeout, unusable reply) is logged and
/// replaced by the [`HeuristicAdvisor`] decision, so a run never fails
/// because of the remote service.
///
/// # Example
///
/// ```rust,ignore
/// use autoprep::ai::ChatCompletionsProvider;
/// use autoprep::decisions::RemoteAdvisor;
/// use std::sync::Arc;
///
/// let provider = ChatCompletionsProvider::new("api-key", "https://llm.example.com/v1/chat/completions")?;
/// let advisor = RemoteAdvisor::new(Arc::new(provider));
/// ```
pub struct RemoteAdvisor {
    provider: Arc<dyn AIProvider>,
    fallback: HeuristicAdvisor,
}

impl RemoteAdvisor {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            fallback: HeuristicAdvisor::new(),
        }
    }

    pub fn provider(&self) -> &dyn AIProvider {
        self.provider.as_ref()
    }
}

impl StrategyAdvisor for RemoteAdvisor {
    fn advise(&self, column: &ColumnStatsEntry, model_hint: Option<&str>) -> Decision {
        match self.provider.recommend_strategy(column, model_hint) {
            Ok(decision) => {
                debug!(
                    "{} decision for '{}': imputation={}, encoding={:?}, scaling={:?}",
                    self.provider.name(),
                    column.name,
                    decision.imputation,
                    decision.encoding,
                    decision.scaling
                );
                decision
            }
            Err(e) => {
                warn!(
                    "{} advisor failed for '{}', using heuristic: {}",
                    self.provider.name(),
                    column.name,
                    e
                );
                self.fallback.advise(column, model_hint)
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncodingMethod, ImputationMethod};
    use crate::types::ColumnType;
    use anyhow::{Result, anyhow};
    use std::sync::Mutex;

    /// Returns a fixed decision and records the model hints it saw.
    struct Scripted {
        decision: Decision,
        hints: Mutex<Vec<Option<String>>>,
    }

    impl AIProvider for Scripted {
        fn recommend_strategy(
            &self,
            _column: &ColumnStatsEntry,
            model_hint: Option<&str>,
        ) -> Result<Decision> {
            if let Ok(mut hints) = self.hints.lock() {
                hints.push(model_hint.map(str::to_string));
            }
            Ok(self.decision.clone())
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    struct Failing;

    impl AIProvider for Failing {
        fn recommend_strategy(
            &self,
            _column: &ColumnStatsEntry,
            _model_hint: Option<&str>,
        ) -> Result<Decision> {
            Err(anyhow!("timed out"))
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    #[test]
    fn test_remote_decision_is_used() {
        let scripted = Arc::new(Scripted {
            decision: Decision::new(
                ImputationMethod::Knn,
                None,
                None,
                "neighbors carry signal",
            ),
            hints: Mutex::new(Vec::new()),
        });
        let advisor = RemoteAdvisor::new(scripted.clone());

        let entry = ColumnStatsEntry::new("x", ColumnType::Numeric, 0.1, 30);
        let decision = advisor.advise(&entry, Some("qwen3-32b"));

        assert_eq!(decision.imputation, ImputationMethod::Knn);
        assert_eq!(decision.reason, "neighbors carry signal");
        assert_eq!(
            *scripted.hints.lock().unwrap(),
            vec![Some("qwen3-32b".to_string())]
        );
    }

    #[test]
    fn test_provider_failure_falls_back_to_heuristic() {
        let advisor = RemoteAdvisor::new(Arc::new(Failing));
        let entry = ColumnStatsEntry::new("city", ColumnType::Categorical, 0.0, 4);

        let decision = advisor.advise(&entry, None);
        assert_eq!(decision.imputation, ImputationMethod::MostFrequent);
        assert_eq!(decision.encoding, Some(EncodingMethod::OneHot));
        assert_eq!(advisor.provider().name(), "Failing");
    }
}

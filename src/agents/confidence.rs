//! Confidence scoring and execution-mode selection.
//!
//! The score is a crude heuristic over the finished result. It never calls the
//! LLM and is recomputed from scratch for every run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agents::orchestrator::NegotiationResult;

const LONG_STRATEGY_CHARS: usize = 200;
const LONG_STRATEGY_WEIGHT: f64 = 0.3;
const COMPETITOR_WEIGHT: f64 = 0.2;
const ERROR_WEIGHT: f64 = 0.2;
const BASE_CONFIDENCE: f64 = 0.3;

/// Scores above this are executed automatically
pub const AUTO_EXECUTE_THRESHOLD: f64 = 0.8;
/// Scores above this (and not above [`AUTO_EXECUTE_THRESHOLD`]) are supervised
pub const SUPERVISED_THRESHOLD: f64 = 0.5;

/// How a finished negotiation is handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    AutoExecute,
    Supervised,
    HumanHandoff,
}

impl ExecutionMode {
    pub fn from_score(score: f64) -> Self {
        if score > AUTO_EXECUTE_THRESHOLD {
            Self::AutoExecute
        } else if score > SUPERVISED_THRESHOLD {
            Self::Supervised
        } else {
            Self::HumanHandoff
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoExecute => "auto_execute",
            Self::Supervised => "supervised",
            Self::HumanHandoff => "human_handoff",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score a negotiation result in `[0.3, 1.0]`.
///
/// Signals are added in a fixed order: a strategy longer than 200 characters,
/// the word "competitor" anywhere in the serialized result, the word "error"
/// anywhere in the serialized result, then the base score.
pub fn score(result: &NegotiationResult) -> f64 {
    let mut confidence = 0.0;

    if result.strategy.chars().count() > LONG_STRATEGY_CHARS {
        confidence += LONG_STRATEGY_WEIGHT;
    }

    let serialized = serde_json::to_string(result)
        .unwrap_or_default()
        .to_lowercase();
    if serialized.contains("competitor") {
        confidence += COMPETITOR_WEIGHT;
    }
    if serialized.contains("error") {
        confidence += ERROR_WEIGHT;
    }

    confidence += BASE_CONFIDENCE;
    f64::min(confidence, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::router::Category;
    use crate::agents::state::{NegotiationState, StateField};

    fn result_with(strategy: &str) -> NegotiationResult {
        let state = NegotiationState::new("ELECTRIC BILL", "City Power", 80.0);
        NegotiationResult::new(Category::Utility, strategy.to_string(), state, 0.0)
    }

    fn set_detail(result: &mut NegotiationResult, field: StateField, value: &str) {
        result
            .details
            .as_mut()
            .expect("result should carry details")
            .set(field, value);
    }

    #[test]
    fn test_base_score_only() {
        let result = result_with("Call and ask nicely.");
        assert!((score(&result) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_signals_reach_auto_execute() {
        let mut result = result_with(&"x".repeat(201));
        set_detail(&mut result, StateField::PlanAnalysis, "competitor pricing, no billing error found");
        let confidence = score(&result);
        assert!((confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(ExecutionMode::from_score(confidence), ExecutionMode::AutoExecute);
    }

    #[test]
    fn test_strategy_length_counts_characters() {
        // 200 characters is not enough
        let result = result_with(&"é".repeat(200));
        assert!((score(&result) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_signal_combinations_are_monotonic() {
        // (long strategy, competitor, error) -> expected score
        let cases = [
            ((false, false, false), 0.3),
            ((true, false, false), 0.6),
            ((false, true, false), 0.5),
            ((false, false, true), 0.5),
            ((true, true, false), 0.8),
            ((true, false, true), 0.8),
            ((false, true, true), 0.7),
            ((true, true, true), 1.0),
        ];

        let score_of = |(long, competitor, error): (bool, bool, bool)| {
            let strategy = if long { "a".repeat(201) } else { "Ask nicely.".to_string() };
            let mut result = result_with(&strategy);
            if competitor {
                set_detail(&mut result, StateField::PlanAnalysis, "Competitor plan is cheaper");
            }
            if error {
                set_detail(&mut result, StateField::Script, "A billing ERROR was found");
            }
            score(&result)
        };

        for (signals, expected) in cases {
            let confidence = score_of(signals);
            assert!(
                (confidence - expected).abs() < 1e-9,
                "{signals:?}: expected {expected}, got {confidence}"
            );
            assert!((0.3..=1.0).contains(&confidence));

            // Turning any one signal on never lowers the score
            let (long, competitor, error) = signals;
            for raised in [(true, competitor, error), (long, true, error), (long, competitor, true)] {
                assert!(score_of(raised) >= confidence - 1e-9, "{raised:?} below {signals:?}");
            }
        }
    }

    #[test]
    fn test_carried_fields_feed_the_signals() {
        let mut state = NegotiationState::new("Competitor offer enclosed", "Acme", 50.0);
        state.set(StateField::NegotiationStrategy, "Ask nicely.");
        let result = NegotiationResult::new(Category::Utility, "Ask nicely.".to_string(), state, 0.0);
        assert!((score(&result) - 0.5).abs() < 1e-9);

        let state = NegotiationState::new("ELECTRIC BILL", "Error Telecom Ltd", 50.0);
        let result = NegotiationResult::new(Category::Utility, String::new(), state, 0.0);
        assert!((score(&result) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mode_boundaries() {
        assert_eq!(ExecutionMode::from_score(0.8), ExecutionMode::Supervised);
        assert_eq!(ExecutionMode::from_score(0.81), ExecutionMode::AutoExecute);
        assert_eq!(ExecutionMode::from_score(0.5), ExecutionMode::HumanHandoff);
        assert_eq!(ExecutionMode::from_score(0.51), ExecutionMode::Supervised);
        assert_eq!(ExecutionMode::from_score(0.3), ExecutionMode::HumanHandoff);
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionMode::HumanHandoff).expect("serialize");
        assert_eq!(json, "\"human_handoff\"");
    }
}

//! Bill classification.
//!
//! Two interchangeable strategies sit behind [`BillRouter`]: an LLM classifier
//! and a keyword matcher. Neither ever fails to produce a category; unknown
//! input falls back to [`Category::Utility`] with `fallback` set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::agents::pipeline::{PipelineError, PromptTemplate};
use crate::agents::prompts::ROUTER_PROMPT;
use crate::agents::state::NegotiationState;
use crate::llm::{CallPolicy, CompletionRequest, LlmClient, LlmError, ModelSettings, complete_with_policy};
use crate::{log_debug, log_warn};

/// Bill category handled by one specialist
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Category {
    Utility,
    Medical,
    Subscription,
    Telecom,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Utility,
        Category::Medical,
        Category::Subscription,
        Category::Telecom,
    ];

    /// Category used when a bill cannot be classified
    pub const FALLBACK: Category = Category::Utility;

    /// Parse a model response: trimmed, uppercased, exact label match only
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_ref() == normalized)
    }
}

/// Result of classifying one bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Category,
    /// True when the category is the default rather than a real match
    pub fallback: bool,
    /// The raw classifier output (model response or matched keyword)
    pub raw: String,
}

impl Classification {
    pub fn matched(category: Category, raw: impl Into<String>) -> Self {
        Self {
            category,
            fallback: false,
            raw: raw.into(),
        }
    }

    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            category: Category::FALLBACK,
            fallback: true,
            raw: raw.into(),
        }
    }
}

/// Which classifier to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouterStrategy {
    #[default]
    Llm,
    Keyword,
}

#[async_trait]
pub trait BillRouter: Send + Sync {
    fn strategy(&self) -> RouterStrategy;

    async fn classify(&self, ocr_text: &str) -> Result<Classification, LlmError>;
}

/// Single-call LLM classifier
pub struct LlmRouter {
    llm: Arc<dyn LlmClient>,
    settings: ModelSettings,
    policy: CallPolicy,
    template: PromptTemplate,
}

impl LlmRouter {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        settings: ModelSettings,
        policy: CallPolicy,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            llm,
            settings,
            policy,
            template: PromptTemplate::parse(ROUTER_PROMPT)?,
        })
    }

    pub fn prompt_for(&self, ocr_text: &str) -> String {
        let state = NegotiationState::new(ocr_text, "", 0.0);
        self.template.render(&state, &[])
    }
}

#[async_trait]
impl BillRouter for LlmRouter {
    fn strategy(&self) -> RouterStrategy {
        RouterStrategy::Llm
    }

    async fn classify(&self, ocr_text: &str) -> Result<Classification, LlmError> {
        let request = CompletionRequest::new(self.prompt_for(ocr_text), self.settings.clone());
        let response = complete_with_policy(self.llm.as_ref(), &request, self.policy).await?;

        match Category::from_label(&response) {
            Some(category) => {
                log_debug!("Bill classified as {}", category);
                Ok(Classification::matched(category, response))
            }
            None => {
                log_warn!(
                    "Unrecognised bill category {:?}, falling back to {}",
                    response.trim(),
                    Category::FALLBACK
                );
                Ok(Classification::fallback(response))
            }
        }
    }
}

/// Keyword lists checked in priority order
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Utility, &["electric", "gas", "water", "utility", "power", "kwh"]),
    (Category::Medical, &["hospital", "medical", "doctor", "health", "patient"]),
    (
        Category::Subscription,
        &["netflix", "spotify", "subscription", "streaming", "monthly"],
    ),
    (
        Category::Telecom,
        &["verizon", "at&t", "phone", "wireless", "internet", "data"],
    ),
];

/// Offline classifier using lowercase substring matches
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRouter;

impl KeywordRouter {
    pub fn classify_text(ocr_text: &str) -> Classification {
        let text = ocr_text.to_lowercase();
        for (category, keywords) in KEYWORDS {
            if let Some(keyword) = keywords.iter().find(|keyword| text.contains(*keyword)) {
                return Classification::matched(*category, *keyword);
            }
        }
        log_warn!(
            "No category keyword found, falling back to {}",
            Category::FALLBACK
        );
        Classification::fallback("")
    }
}

#[async_trait]
impl BillRouter for KeywordRouter {
    fn strategy(&self) -> RouterStrategy {
        RouterStrategy::Keyword
    }

    async fn classify(&self, ocr_text: &str) -> Result<Classification, LlmError> {
        Ok(Self::classify_text(ocr_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_is_exact_after_normalisation() {
        assert_eq!(Category::from_label("  medical \n"), Some(Category::Medical));
        assert_eq!(Category::from_label("Telecom"), Some(Category::Telecom));
        assert_eq!(Category::from_label("MEDICAL bill"), None);
        assert_eq!(Category::from_label(""), None);
    }

    #[test]
    fn test_category_serializes_uppercase() {
        let json = serde_json::to_string(&Category::Subscription).expect("serialize");
        assert_eq!(json, "\"SUBSCRIPTION\"");
        assert_eq!(Category::Telecom.to_string(), "TELECOM");
    }

    #[test]
    fn test_keyword_priority_prefers_utility() {
        // "gas" (utility) and "hospital" (medical) both match
        let classification = KeywordRouter::classify_text("Hospital gas supply invoice");
        assert_eq!(classification.category, Category::Utility);
        assert!(!classification.fallback);
    }

    #[test]
    fn test_keyword_fallback_is_flagged() {
        let classification = KeywordRouter::classify_text("Invoice #42 for consulting");
        assert_eq!(classification.category, Category::Utility);
        assert!(classification.fallback);
    }

    #[test]
    fn test_all_matches_declaration_order() {
        use strum::IntoEnumIterator;
        assert_eq!(Category::iter().collect::<Vec<_>>(), Category::ALL.to_vec());
    }

    #[test]
    fn test_router_strategy_parses() {
        assert_eq!("keyword".parse::<RouterStrategy>().ok(), Some(RouterStrategy::Keyword));
        assert_eq!(RouterStrategy::default(), RouterStrategy::Llm);
    }
}

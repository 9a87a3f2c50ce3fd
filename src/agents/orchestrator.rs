//! Master orchestrator.
//!
//! Drives one bill through `ROUTE → EXECUTE → EVALUATE → finalizer → DONE`.
//! The only branch is the confidence-based choice of finalizer. The
//! orchestrator holds no per-request state and is shared behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

use crate::agents::confidence::{ExecutionMode, score};
use crate::agents::pipeline::PipelineError;
use crate::agents::router::{BillRouter, Category, Classification, KeywordRouter, LlmRouter, RouterStrategy};
use crate::agents::specialized::{SpecialistPipeline, build_registry};
use crate::agents::state::{BillInput, NegotiationState};
use crate::config::Config;
use crate::llm::{LlmClient, LlmError};
use crate::{log_debug, log_info, log_warn};

/// Savings rate tables, one rate per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SavingsTable {
    /// Rates used to estimate savings for a new negotiation
    #[default]
    Standard,
    /// Rates reported as historical averages
    Historical,
}

impl SavingsTable {
    pub const fn rate(self, category: Category) -> f64 {
        match (self, category) {
            (Self::Standard, Category::Utility) => 0.15,
            (Self::Historical, Category::Utility) => 0.18,
            (_, Category::Medical) => 0.35,
            (_, Category::Subscription) => 0.25,
            (Self::Standard, Category::Telecom) => 0.20,
            (Self::Historical, Category::Telecom) => 0.22,
        }
    }

    pub fn rates(self) -> BTreeMap<Category, f64> {
        Category::ALL
            .iter()
            .map(|category| (*category, self.rate(*category)))
            .collect()
    }
}

/// Status written by a finalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    AutoExecuted,
    Supervised,
    HumanHandoff,
}

impl NegotiationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoExecuted => "auto_executed",
            Self::Supervised => "supervised",
            Self::HumanHandoff => "human_handoff",
        }
    }
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a specialist run, completed by one finalizer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiationResult {
    pub agent_type: Category,
    pub strategy: String,
    /// Final specialist state, carried bill fields included. `None` when no
    /// specialist ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<NegotiationState>,
    pub estimated_savings: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NegotiationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    /// Set when no specialist could handle the bill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NegotiationResult {
    pub fn new(
        agent_type: Category,
        strategy: String,
        details: NegotiationState,
        estimated_savings: f64,
    ) -> Self {
        Self {
            agent_type,
            strategy,
            details: Some(details),
            estimated_savings,
            status: None,
            message: None,
            next_steps: Vec::new(),
            error: None,
        }
    }

    /// Result for a category with no registered specialist
    pub fn no_agent(category: Category) -> Self {
        Self {
            agent_type: category,
            strategy: String::new(),
            details: None,
            estimated_savings: 0.0,
            status: None,
            message: None,
            next_steps: Vec::new(),
            error: Some(format!("No agent found for type: {category}")),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    fn finalize(&mut self, status: NegotiationStatus, message: &str, next_steps: &[&str]) {
        self.status = Some(status);
        self.message = Some(message.to_string());
        self.next_steps = next_steps.iter().map(|step| (*step).to_string()).collect();
    }
}

/// Stages of the orchestration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorStage {
    Route,
    Execute,
    Evaluate,
    AutoExecute,
    Supervised,
    HumanHandoff,
    Done,
}

impl OrchestratorStage {
    /// The stage following `self`.
    ///
    /// `mode` is only consulted when leaving `Evaluate`; an evaluation that
    /// produced no mode hands off to a human.
    pub fn next(self, mode: Option<ExecutionMode>) -> Self {
        match self {
            Self::Route => Self::Execute,
            Self::Execute => Self::Evaluate,
            Self::Evaluate => mode.map_or(Self::HumanHandoff, Self::from),
            Self::AutoExecute | Self::Supervised | Self::HumanHandoff | Self::Done => Self::Done,
        }
    }

    pub fn is_finalizer(self) -> bool {
        matches!(self, Self::AutoExecute | Self::Supervised | Self::HumanHandoff)
    }
}

impl From<ExecutionMode> for OrchestratorStage {
    fn from(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::AutoExecute => Self::AutoExecute,
            ExecutionMode::Supervised => Self::Supervised,
            ExecutionMode::HumanHandoff => Self::HumanHandoff,
        }
    }
}

/// Everything produced by one orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationOutcome {
    pub classification: Classification,
    pub result: NegotiationResult,
    pub confidence: f64,
    pub execution_mode: ExecutionMode,
    /// Call script from the specialist, if it writes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Stages in the order they ran
    pub visited: Vec<OrchestratorStage>,
}

/// Failures that abort an orchestration run
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("bill classification failed: {0}")]
    Routing(#[from] LlmError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Sequences routing, specialist execution, scoring and finalization
pub struct MasterOrchestrator {
    router: Arc<dyn BillRouter>,
    specialists: HashMap<Category, SpecialistPipeline>,
    savings: SavingsTable,
}

impl MasterOrchestrator {
    pub fn new(
        router: Arc<dyn BillRouter>,
        specialists: HashMap<Category, SpecialistPipeline>,
        savings: SavingsTable,
    ) -> Self {
        Self {
            router,
            specialists,
            savings,
        }
    }

    /// Build the router and every built-in specialist from configuration
    pub fn from_config(llm: &Arc<dyn LlmClient>, config: &Config) -> Result<Self, PipelineError> {
        let router: Arc<dyn BillRouter> = match config.negotiation.router {
            RouterStrategy::Llm => Arc::new(LlmRouter::new(
                Arc::clone(llm),
                config.classification_settings(),
                config.call_policy(),
            )?),
            RouterStrategy::Keyword => Arc::new(KeywordRouter),
        };
        let specialists = build_registry(llm, config)?;

        log_debug!(
            "Orchestrator ready: {} router, {} savings table, {} specialists",
            config.negotiation.router,
            config.negotiation.savings_table,
            specialists.len()
        );
        Ok(Self::new(router, specialists, config.negotiation.savings_table))
    }

    pub fn router(&self) -> &dyn BillRouter {
        self.router.as_ref()
    }

    pub fn savings_table(&self) -> SavingsTable {
        self.savings
    }

    pub fn specialist(&self, category: Category) -> Option<&SpecialistPipeline> {
        self.specialists.get(&category)
    }

    /// Registered specialists in category order
    pub fn specialists(&self) -> Vec<&SpecialistPipeline> {
        Category::ALL
            .iter()
            .filter_map(|category| self.specialists.get(category))
            .collect()
    }

    pub async fn classify(&self, ocr_text: &str) -> Result<Classification, NegotiationError> {
        Ok(self.router.classify(ocr_text).await?)
    }

    /// Run one bill through the state machine
    pub async fn process_bill(&self, bill: &BillInput) -> Result<NegotiationOutcome, NegotiationError> {
        let mut stage = OrchestratorStage::Route;
        let mut visited = vec![stage];

        let classification = self.classify(&bill.text).await?;
        log_info!(
            "Routing {} bill from {} to the {} specialist",
            if classification.fallback { "unclassified" } else { "classified" },
            bill.company,
            classification.category
        );

        stage = stage.next(None);
        visited.push(stage);
        let (mut result, script) = self.execute(classification.category, bill).await?;

        stage = stage.next(None);
        visited.push(stage);
        let confidence = score(&result);
        let execution_mode = ExecutionMode::from_score(confidence);
        log_debug!("Confidence {:.2} selects {}", confidence, execution_mode);

        stage = stage.next(Some(execution_mode));
        visited.push(stage);
        finalize(stage, &mut result);

        stage = stage.next(None);
        visited.push(stage);

        Ok(NegotiationOutcome {
            classification,
            result,
            confidence,
            execution_mode,
            script,
            visited,
        })
    }

    async fn execute(
        &self,
        category: Category,
        bill: &BillInput,
    ) -> Result<(NegotiationResult, Option<String>), NegotiationError> {
        let Some(specialist) = self.specialists.get(&category) else {
            log_warn!("No specialist registered for {}", category);
            return Ok((NegotiationResult::no_agent(category), None));
        };

        let state = specialist.run(bill).await?;
        let strategy = specialist.strategy(&state);
        let script = specialist.script(&state);
        let estimated_savings = bill.amount * self.savings.rate(category);

        let result = NegotiationResult::new(category, strategy, state, estimated_savings);
        Ok((result, script))
    }
}

/// Apply the finalizer for `stage`; non-finalizer stages leave the result
/// untouched
pub fn finalize(stage: OrchestratorStage, result: &mut NegotiationResult) {
    match stage {
        OrchestratorStage::AutoExecute => result.finalize(
            NegotiationStatus::AutoExecuted,
            "High confidence - executing automatically",
            &[
                "Contact customer service using provided strategy",
                "Reference competitor rates and loyalty history",
                "Request supervisor if initial agent cannot help",
            ],
        ),
        OrchestratorStage::Supervised => result.finalize(
            NegotiationStatus::Supervised,
            "Medium confidence - requires supervision",
            &[
                "Review strategy before contacting company",
                "Have backup options ready",
                "Consider human oversight during call",
            ],
        ),
        OrchestratorStage::HumanHandoff => result.finalize(
            NegotiationStatus::HumanHandoff,
            "Low confidence - human intervention required",
            &[
                "Consult with negotiation expert",
                "Gather additional information",
                "Consider professional negotiation service",
            ],
        ),
        OrchestratorStage::Route
        | OrchestratorStage::Execute
        | OrchestratorStage::Evaluate
        | OrchestratorStage::Done => {}
    }
}

//! Negotiation agent system
//!
//! This module holds the orchestration engine: the shared pipeline type, the
//! bill router, the four specialist pipelines, confidence scoring and the
//! master orchestrator that sequences them.

// Engine
pub mod pipeline;
pub mod state;

// Agents
pub mod orchestrator;
pub mod router;
pub mod specialized;

// Scoring, prompts and helpers
pub mod confidence;
pub mod prompts;
pub mod tools;

// Re-exports for public API
pub use confidence::{ExecutionMode, score};
pub use orchestrator::{
    MasterOrchestrator, NegotiationError, NegotiationOutcome, NegotiationResult, NegotiationStatus,
    OrchestratorStage, SavingsTable,
};
pub use pipeline::{LlmStep, Pipeline, PipelineError, PromptTemplate, Step, StepFailure};
pub use router::{BillRouter, Category, Classification, KeywordRouter, LlmRouter, RouterStrategy};
pub use specialized::{SpecialistPipeline, SpecialistSpec};
pub use state::{BillInput, NegotiationState, StateField};

//! Hagglz - AI-powered bill negotiation
//!
//! This library routes a scanned bill to one of four specialist LLM pipelines
//! (utility, medical, subscription, telecom), scores the resulting strategy and
//! decides whether it can be executed automatically, under supervision, or
//! needs a human.

// Allow certain clippy warnings that are either stylistic or from external dependencies
#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::future_not_send)] // From Rig framework internals, can't fix
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod agents;
pub mod api;
pub mod cli;
pub mod config;
pub mod llm;
pub mod logger;
pub mod memory;
pub mod ocr;
pub mod providers;
pub mod ui;

// Re-export important structs and functions for easier testing
pub use agents::{
    BillInput, Category, Classification, ExecutionMode, MasterOrchestrator, NegotiationOutcome,
    NegotiationResult,
};
pub use config::Config;
pub use llm::{CompletionRequest, LlmClient, LlmError, ModelSettings};
pub use providers::Provider;

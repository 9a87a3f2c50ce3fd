//! Pipeline engine shared by every specialist.
//!
//! A [`Pipeline`] is a straight-line chain of [`Step`]s. Each step receives the
//! state produced by the previous one, may issue a single LLM call and writes
//! the one field it owns. The first failing step aborts the whole run.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::agents::state::{NegotiationState, StateField};
use crate::llm::{CallPolicy, CompletionRequest, LlmClient, LlmError, ModelSettings, complete_with_policy};
use crate::{log_debug, trace_debug};

/// Why a single step could not produce its output
#[derive(Debug, Clone, thiserror::Error)]
pub enum StepFailure {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("the model returned an empty response")]
    EmptyResponse,
}

/// Errors raised while building or running a pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("step '{step}' of the {pipeline} pipeline failed: {cause}")]
    StepExecution {
        pipeline: String,
        step: String,
        #[source]
        cause: StepFailure,
    },
    #[error("invalid {pipeline} pipeline: {reason}")]
    Definition { pipeline: String, reason: String },
    #[error("invalid prompt template: {0}")]
    Template(String),
}

/// A value that can be substituted into a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    OcrText,
    Company,
    Amount,
    ProvenScripts,
    Field(StateField),
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "ocr_text" => Some(Self::OcrText),
            "company" => Some(Self::Company),
            "amount" => Some(Self::Amount),
            "proven_scripts" => Some(Self::ProvenScripts),
            other => StateField::from_key(other).map(Self::Field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Fixed instructional text with `{placeholder}` slots.
///
/// Rendering is a pure function of the state: the same state always yields
/// the same prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self, PipelineError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }
            let close = tail.find('}').ok_or_else(|| {
                PipelineError::Template(format!("unclosed placeholder in '{}'", preview(tail)))
            })?;
            let name = &tail[1..close];
            let placeholder = Placeholder::parse(name)
                .ok_or_else(|| PipelineError::Template(format!("unknown placeholder '{{{name}}}'")))?;
            segments.push(Segment::Slot(placeholder));
            rest = &tail[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Step-owned fields this template reads
    pub fn fields(&self) -> Vec<StateField> {
        let mut fields = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(Placeholder::Field(field)) = segment {
                if !fields.contains(field) {
                    fields.push(*field);
                }
            }
        }
        fields
    }

    pub fn render(&self, state: &NegotiationState, proven_scripts: &[String]) -> String {
        let mut prompt = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Slot(Placeholder::OcrText) => prompt.push_str(&state.ocr_text),
                Segment::Slot(Placeholder::Company) => prompt.push_str(&state.company),
                Segment::Slot(Placeholder::Amount) => prompt.push_str(&format!("{:.2}", state.amount)),
                Segment::Slot(Placeholder::ProvenScripts) => prompt.push_str(&proven_scripts.join("\n")),
                Segment::Slot(Placeholder::Field(field)) => {
                    prompt.push_str(state.get(*field).unwrap_or_default());
                }
            }
        }
        prompt
    }
}

fn preview(text: &str) -> String {
    text.chars().take(24).collect()
}

/// One node of a pipeline
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Step-owned fields that must already be populated
    fn reads(&self) -> Vec<StateField>;

    /// The field this step writes
    fn writes(&self) -> StateField;

    async fn run(&self, state: NegotiationState) -> Result<NegotiationState, StepFailure>;
}

/// A step that renders a prompt, calls the LLM once and stores the response
pub struct LlmStep {
    name: String,
    template: PromptTemplate,
    proven_scripts: Vec<String>,
    output: StateField,
    settings: ModelSettings,
    policy: CallPolicy,
    llm: Arc<dyn LlmClient>,
}

impl LlmStep {
    pub fn new(
        name: impl Into<String>,
        template: PromptTemplate,
        output: StateField,
        settings: ModelSettings,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            proven_scripts: Vec::new(),
            output,
            settings,
            policy: CallPolicy::default(),
            llm,
        }
    }

    #[must_use]
    pub fn with_proven_scripts(mut self, scripts: Vec<String>) -> Self {
        self.proven_scripts = scripts;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn render_prompt(&self, state: &NegotiationState) -> String {
        self.template.render(state, &self.proven_scripts)
    }
}

impl fmt::Debug for LlmStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmStep")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for LlmStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn reads(&self) -> Vec<StateField> {
        self.template.fields()
    }

    fn writes(&self) -> StateField {
        self.output
    }

    async fn run(&self, mut state: NegotiationState) -> Result<NegotiationState, StepFailure> {
        let request = CompletionRequest::new(self.render_prompt(&state), self.settings.clone());
        let response = complete_with_policy(self.llm.as_ref(), &request, self.policy).await?;

        if response.trim().is_empty() {
            return Err(StepFailure::EmptyResponse);
        }

        state.set(self.output, response);
        Ok(state)
    }
}

/// An ordered, validated chain of steps
pub struct Pipeline {
    name: String,
    steps: Vec<Arc<dyn Step>>,
}

impl Pipeline {
    /// Build a pipeline, rejecting step orders that read a field before an
    /// earlier step writes it, or that give one field two owners.
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn Step>>) -> Result<Self, PipelineError> {
        let name = name.into();
        let definition_error = |reason: String| PipelineError::Definition {
            pipeline: name.clone(),
            reason,
        };

        if steps.is_empty() {
            return Err(definition_error("a pipeline needs at least one step".to_string()));
        }

        let mut step_names = BTreeSet::new();
        let mut written = BTreeSet::new();
        for step in &steps {
            if !step_names.insert(step.name().to_string()) {
                return Err(definition_error(format!("duplicate step name '{}'", step.name())));
            }
            if let Some(missing) = step.reads().into_iter().find(|field| !written.contains(field)) {
                return Err(definition_error(format!(
                    "step '{}' reads '{}' before any earlier step writes it",
                    step.name(),
                    missing
                )));
            }
            if !written.insert(step.writes()) {
                return Err(definition_error(format!(
                    "field '{}' is written by more than one step",
                    step.writes()
                )));
            }
        }

        Ok(Self { name, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn Step> {
        self.steps.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fields populated by a successful run, in step order
    pub fn field_set(&self) -> Vec<StateField> {
        self.steps.iter().map(|step| step.writes()).collect()
    }

    /// Run every step in order, threading the state through
    pub async fn run(&self, initial: NegotiationState) -> Result<NegotiationState, PipelineError> {
        let mut state = initial;
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            log_debug!(
                "🔗 {} pipeline: step {}/{} '{}' started",
                self.name,
                index + 1,
                total,
                step.name()
            );

            state = step.run(state).await.map_err(|cause| {
                crate::log_warn!(
                    "{} pipeline: step '{}' failed: {}",
                    self.name,
                    step.name(),
                    cause
                );
                PipelineError::StepExecution {
                    pipeline: self.name.clone(),
                    step: step.name().to_string(),
                    cause,
                }
            })?;

            trace_debug!(
                pipeline = %self.name,
                step = step.name(),
                field = %step.writes(),
                "step completed"
            );
        }

        Ok(state)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(|step| step.name()).collect();
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &steps)
            .finish()
    }
}

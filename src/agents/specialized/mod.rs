//! Negotiation specialists.
//!
//! Every specialist is the same [`Pipeline`] type built from a declarative
//! [`SpecialistSpec`]. Adding a category means adding a spec, not a new agent
//! type.

pub mod medical;
pub mod subscription;
pub mod telecom;
pub mod utility;

pub use medical::MEDICAL;
pub use subscription::SUBSCRIPTION;
pub use telecom::TELECOM;
pub use utility::UTILITY;

use std::collections::HashMap;
use std::sync::Arc;

use crate::agents::pipeline::{LlmStep, Pipeline, PipelineError, PromptTemplate, Step};
use crate::agents::router::Category;
use crate::agents::state::{BillInput, NegotiationState, StateField};
use crate::config::Config;
use crate::llm::LlmClient;
use crate::log_debug;
use crate::providers::Provider;

/// One prompt step of a specialist
#[derive(Debug)]
pub struct StepSpec {
    pub name: &'static str,
    pub template: &'static str,
    pub proven_scripts: &'static [&'static str],
    pub output: StateField,
}

/// Declarative description of a specialist pipeline
#[derive(Debug)]
pub struct SpecialistSpec {
    pub category: Category,
    pub steps: &'static [StepSpec],
    /// Field surfaced as the negotiation strategy
    pub strategy_field: StateField,
    /// Field surfaced as the call script, if the specialist writes one
    pub script_field: Option<StateField>,
    /// Provider override; `None` uses the configured default
    pub provider: Option<Provider>,
    pub temperature: f64,
}

impl SpecialistSpec {
    /// All built-in specialists in category order
    pub fn all() -> [&'static SpecialistSpec; 4] {
        [&UTILITY, &MEDICAL, &SUBSCRIPTION, &TELECOM]
    }

    pub fn for_category(category: Category) -> &'static SpecialistSpec {
        match category {
            Category::Utility => &UTILITY,
            Category::Medical => &MEDICAL,
            Category::Subscription => &SUBSCRIPTION,
            Category::Telecom => &TELECOM,
        }
    }

    /// Provider the spec runs on under the given configuration
    pub fn provider(&self, config: &Config) -> Provider {
        self.provider.unwrap_or(config.default_provider)
    }

    /// Build the runnable pipeline, applying per-step model overrides from the
    /// configuration
    pub fn build(
        &self,
        llm: &Arc<dyn LlmClient>,
        config: &Config,
    ) -> Result<SpecialistPipeline, PipelineError> {
        let provider = self.provider(config);
        let policy = config.call_policy();

        let mut steps: Vec<Arc<dyn Step>> = Vec::with_capacity(self.steps.len());
        for step in self.steps {
            let settings = config.step_settings(self.category, step.name, provider, self.temperature);
            let scripts = step.proven_scripts.iter().map(|s| (*s).to_string()).collect();
            let llm_step = LlmStep::new(
                step.name,
                PromptTemplate::parse(step.template)?,
                step.output,
                settings,
                Arc::clone(llm),
            )
            .with_proven_scripts(scripts)
            .with_policy(policy);
            steps.push(Arc::new(llm_step));
        }

        let pipeline = Pipeline::new(self.category.to_string(), steps)?;
        Ok(SpecialistPipeline::new(
            self.category,
            pipeline,
            self.strategy_field,
            self.script_field,
        ))
    }
}

/// A built pipeline together with the fields the orchestrator surfaces
#[derive(Debug)]
pub struct SpecialistPipeline {
    category: Category,
    pipeline: Pipeline,
    strategy_field: StateField,
    script_field: Option<StateField>,
}

impl SpecialistPipeline {
    pub fn new(
        category: Category,
        pipeline: Pipeline,
        strategy_field: StateField,
        script_field: Option<StateField>,
    ) -> Self {
        Self {
            category,
            pipeline,
            strategy_field,
            script_field,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn strategy_field(&self) -> StateField {
        self.strategy_field
    }

    pub fn script_field(&self) -> Option<StateField> {
        self.script_field
    }

    pub async fn run(&self, bill: &BillInput) -> Result<NegotiationState, PipelineError> {
        log_debug!(
            "Running {} specialist ({} steps) for {}",
            self.category,
            self.pipeline.len(),
            bill.company
        );
        self.pipeline.run(NegotiationState::from_bill(bill)).await
    }

    /// The strategy text of a finished run, empty if the field is missing
    pub fn strategy(&self, state: &NegotiationState) -> String {
        state.get(self.strategy_field).unwrap_or_default().to_string()
    }

    pub fn script(&self, state: &NegotiationState) -> Option<String> {
        self.script_field
            .and_then(|field| state.get(field))
            .map(str::to_string)
    }
}

/// Build every built-in specialist, keyed by category
pub fn build_registry(
    llm: &Arc<dyn LlmClient>,
    config: &Config,
) -> Result<HashMap<Category, SpecialistPipeline>, PipelineError> {
    SpecialistSpec::all()
        .into_iter()
        .map(|spec| spec.build(llm, config).map(|pipeline| (spec.category, pipeline)))
        .collect()
}

/// Providers the built-in specialists need under the given configuration
pub fn required_providers(config: &Config) -> Vec<Provider> {
    let mut providers = vec![config.default_provider];
    for spec in SpecialistSpec::all() {
        for step in spec.steps {
            let settings =
                config.step_settings(spec.category, step.name, spec.provider(config), spec.temperature);
            if !providers.contains(&settings.provider) {
                providers.push(settings.provider);
            }
        }
    }
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_cover_every_category() {
        for category in Category::ALL {
            assert_eq!(SpecialistSpec::for_category(*category).category, *category);
        }
    }

    #[test]
    fn test_strategy_and_script_fields_are_written() {
        for spec in SpecialistSpec::all() {
            let written: Vec<StateField> = spec.steps.iter().map(|step| step.output).collect();
            assert!(written.contains(&spec.strategy_field), "{}", spec.category);
            if let Some(script) = spec.script_field {
                assert!(written.contains(&script), "{}", spec.category);
            }
        }
    }

    #[test]
    fn test_step_counts() {
        assert_eq!(UTILITY.steps.len(), 2);
        assert_eq!(MEDICAL.steps.len(), 3);
        assert_eq!(SUBSCRIPTION.steps.len(), 3);
        assert_eq!(TELECOM.steps.len(), 3);
    }
}

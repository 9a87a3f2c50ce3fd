use crate::agents::prompts::utility;
use crate::agents::router::Category;
use crate::agents::specialized::{SpecialistSpec, StepSpec};
use crate::agents::state::StateField;

/// Usage analysis followed by a call script
pub static UTILITY: SpecialistSpec = SpecialistSpec {
    category: Category::Utility,
    steps: &[
        StepSpec {
            name: "analyze",
            template: utility::ANALYZE,
            proven_scripts: &[],
            output: StateField::NegotiationStrategy,
        },
        StepSpec {
            name: "script",
            template: utility::SCRIPT,
            proven_scripts: utility::PROVEN_SCRIPTS,
            output: StateField::Script,
        },
    ],
    strategy_field: StateField::NegotiationStrategy,
    script_field: Some(StateField::Script),
    provider: None,
    temperature: 0.3,
};

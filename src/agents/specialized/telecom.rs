use crate::agents::prompts::telecom;
use crate::agents::router::Category;
use crate::agents::specialized::{SpecialistSpec, StepSpec};
use crate::agents::state::StateField;

/// Plan audit, competitor research, then a call script that doubles as the
/// strategy
pub static TELECOM: SpecialistSpec = SpecialistSpec {
    category: Category::Telecom,
    steps: &[
        StepSpec {
            name: "analyze_plan",
            template: telecom::ANALYZE_PLAN,
            proven_scripts: &[],
            output: StateField::PlanAnalysis,
        },
        StepSpec {
            name: "research",
            template: telecom::RESEARCH,
            proven_scripts: &[],
            output: StateField::CompetitorResearch,
        },
        StepSpec {
            name: "script",
            template: telecom::SCRIPT,
            proven_scripts: telecom::PROVEN_SCRIPTS,
            output: StateField::NegotiationScript,
        },
    ],
    strategy_field: StateField::NegotiationScript,
    script_field: Some(StateField::NegotiationScript),
    provider: None,
    temperature: 0.3,
};

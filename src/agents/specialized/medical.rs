use crate::agents::prompts::medical;
use crate::agents::router::Category;
use crate::agents::specialized::{SpecialistSpec, StepSpec};
use crate::agents::state::StateField;
use crate::providers::Provider;

/// Billing error audit, negotiation plan, then settlement options.
///
/// Runs on Anthropic at a low temperature by default; medical bills reward
/// accuracy over variety.
pub static MEDICAL: SpecialistSpec = SpecialistSpec {
    category: Category::Medical,
    steps: &[
        StepSpec {
            name: "error_check",
            template: medical::ERROR_CHECK,
            proven_scripts: &[],
            output: StateField::Errors,
        },
        StepSpec {
            name: "negotiate",
            template: medical::NEGOTIATE,
            proven_scripts: medical::PROVEN_SCRIPTS,
            output: StateField::NegotiationPlan,
        },
        StepSpec {
            name: "settlements",
            template: medical::SETTLEMENTS,
            proven_scripts: &[],
            output: StateField::SettlementOptions,
        },
    ],
    strategy_field: StateField::NegotiationPlan,
    script_field: None,
    provider: Some(Provider::Anthropic),
    temperature: 0.2,
};

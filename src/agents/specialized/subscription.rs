use crate::agents::prompts::subscription;
use crate::agents::router::Category;
use crate::agents::specialized::{SpecialistSpec, StepSpec};
use crate::agents::state::StateField;

pub static SUBSCRIPTION: SpecialistSpec = SpecialistSpec {
    category: Category::Subscription,
    steps: &[
        StepSpec {
            name: "analyze",
            template: subscription::ANALYZE,
            proven_scripts: &[],
            output: StateField::ServiceAnalysis,
        },
        StepSpec {
            name: "cancellation",
            template: subscription::CANCELLATION,
            proven_scripts: subscription::PROVEN_SCRIPTS,
            output: StateField::CancellationStrategy,
        },
        StepSpec {
            name: "retention",
            template: subscription::RETENTION,
            proven_scripts: &[],
            output: StateField::RetentionOffers,
        },
    ],
    strategy_field: StateField::CancellationStrategy,
    script_field: None,
    provider: None,
    temperature: 0.4,
};

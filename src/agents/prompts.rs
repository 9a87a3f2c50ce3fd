//! Prompt library for the negotiation specialists.
//!
//! Templates use `{placeholder}` slots that are resolved by
//! [`PromptTemplate`](crate::agents::pipeline::PromptTemplate). Only the carried
//! bill fields, `{proven_scripts}` and [`StateField`](crate::agents::state::StateField)
//! keys are valid placeholders.

/// Bill classification prompt. `{ocr_text}` is the only slot.
pub const ROUTER_PROMPT: &str = "Analyze this bill and determine the specialist agent category:
Bill Data: {ocr_text}

Categories:
- UTILITY: Electric, gas, water, waste management bills
- MEDICAL: Healthcare, dental, medical, hospital bills
- SUBSCRIPTION: Streaming services, software subscriptions, memberships
- TELECOM: Phone, internet, cable, wireless bills

Look for company names, service types, and billing patterns.
Return only the category name (UTILITY, MEDICAL, SUBSCRIPTION, or TELECOM).";

pub mod utility {
    pub const ANALYZE: &str = "Analyze this utility bill for negotiation opportunities:
Bill: {ocr_text}

Focus on:
1. Seasonal usage patterns and trends
2. Competitor rates in the area
3. Long-term customer loyalty opportunities
4. Payment history and reliability
5. Energy efficiency programs
6. Budget billing options

Provide a detailed negotiation strategy with specific talking points.";

    pub const SCRIPT: &str = "Create a comprehensive negotiation script for this utility bill:
Strategy: {negotiation_strategy}

Use these proven templates as inspiration:
{proven_scripts}

Generate a complete negotiation dialogue with:
1. Opening statement
2. Key negotiation points
3. Competitor comparisons
4. Fallback positions
5. Closing statements

Make it conversational and professional.";

    pub const PROVEN_SCRIPTS: &[&str] = &[
        "I've been a loyal customer for X years and I'm hoping we can work together to find a better rate.",
        "I see that [competitor] is offering [specific deal]. Can you match or beat that offer?",
        "I'm considering switching providers because the cost has become too high for my budget.",
        "Are there any energy efficiency programs or budget billing options that could help reduce my costs?",
        "I've noticed my usage has been consistent - is there a loyalty discount available?",
    ];
}

pub mod medical {
    pub const ERROR_CHECK: &str = "Analyze this medical bill for errors and discrepancies:
{ocr_text}

Check for:
1. Duplicate charges or services
2. Incorrect CPT codes or procedures
3. Services not received or authorized
4. Insurance processing errors
5. Coding errors (upcoding/unbundling)
6. Incorrect dates of service
7. Wrong provider information

List all identified issues with specific details and line items.";

    pub const NEGOTIATE: &str = "Create a comprehensive medical bill negotiation strategy:

Bill Amount: ${amount}
Errors Found: {errors}

Use these proven medical negotiation approaches:
{proven_scripts}

Generate a detailed negotiation plan including:
1. Error dispute strategy (if applicable)
2. Financial hardship documentation
3. Settlement negotiation tactics
4. Payment plan options
5. Charity care program eligibility
6. Insurance appeal processes

Prioritize the most effective approach based on the bill analysis.";

    pub const SETTLEMENTS: &str = "Based on the negotiation plan and bill amount of ${amount},
calculate realistic settlement options:

Negotiation Plan: {negotiation_plan}

Provide:
1. Immediate cash settlement (typically 10-30% of original)
2. Short-term payment plan settlement (3-6 months)
3. Long-term payment plan (12+ months)
4. Charity care qualification thresholds

Include specific dollar amounts and payment structures.";

    pub const PROVEN_SCRIPTS: &[&str] = &[
        "Is this negotiable? I'm having difficulty paying this amount.",
        "I want to offer you a settlement amount to close out this account.",
        "I'm experiencing financial hardship. Are there assistance programs available?",
        "I noticed some potential billing errors. Can we review these charges?",
        "Can we set up a payment plan that works for both of us?",
        "What's the cash discount if I pay this in full today?",
    ];
}

pub mod subscription {
    pub const ANALYZE: &str = "Analyze this subscription service for negotiation opportunities:
Bill: {ocr_text}

Evaluate:
1. Service tier and features currently used
2. Competitor pricing and offerings
3. Seasonal usage patterns
4. Bundle opportunities or downgrades
5. Promotional rates and new customer offers
6. Loyalty program benefits

Identify the best negotiation angle based on usage and market alternatives.";

    pub const CANCELLATION: &str = "Create a cancellation-based negotiation strategy:

Service Analysis: {service_analysis}
Current Amount: ${amount}

Use these proven cancellation scripts:
{proven_scripts}

Develop a strategy that includes:
1. Cancellation threat timing
2. Competitor comparison points
3. Usage-based downgrade options
4. Seasonal pause opportunities
5. Student/senior discounts
6. Bundle/unbundle strategies

Focus on retention department tactics that typically yield 20-50% savings.";

    pub const RETENTION: &str = "Based on the cancellation strategy and service analysis, predict likely retention offers:

Strategy: {cancellation_strategy}
Service: {service_analysis}

Typical retention offers include:
1. Percentage discounts (10-50% off)
2. Free months or extended trials
3. Feature upgrades at same price
4. Downgrade to cheaper tiers
5. Pause/vacation holds
6. Loyalty rewards or credits

Rank these offers by likelihood and provide counter-negotiation tactics for each.";

    pub const PROVEN_SCRIPTS: &[&str] = &[
        "I need to cancel my subscription due to budget constraints.",
        "I found a better deal with [competitor] and I'm planning to switch.",
        "I'm not using all the features I'm paying for. Can we find a better plan?",
        "I've been a loyal customer for X years. What can you do to keep my business?",
        "I'm consolidating my subscriptions. What's your best retention offer?",
    ];
}

pub mod telecom {
    pub const ANALYZE_PLAN: &str = "Analyze this telecom bill for optimization opportunities:
Bill: {ocr_text}

Examine:
1. Data usage vs plan allowances
2. Voice minutes and text usage
3. International charges and fees
4. Device payment plans
5. Insurance and add-on services
6. Overage charges and patterns
7. Multi-line discounts

Identify areas where the customer is overpaying or underutilizing services.";

    pub const RESEARCH: &str = "Based on the plan analysis, research competitive alternatives:

Plan Analysis: {plan_analysis}
Current Bill: ${amount}

Consider major competitors and their:
1. Comparable plan pricing
2. Promotional rates for new customers
3. Network coverage comparisons
4. Device trade-in programs
5. Bundle opportunities (internet + mobile)
6. Prepaid vs postpaid options

Provide specific competitor names, plans, and pricing for negotiation leverage.";

    pub const SCRIPT: &str = "Create a comprehensive telecom negotiation script:

Plan Analysis: {plan_analysis}
Competitor Research: {competitor_research}

Use these proven telecom negotiation approaches:
{proven_scripts}

Generate a complete negotiation strategy including:
1. Opening with loyalty and payment history
2. Specific competitor offers to leverage
3. Plan optimization requests
4. Fee reduction negotiations
5. Promotional rate requests
6. Retention department escalation
7. Bundle/unbundle considerations

Structure as a conversation flow with multiple negotiation paths.";

    pub const PROVEN_SCRIPTS: &[&str] = &[
        "I've been a loyal customer for X years and my bill keeps increasing.",
        "[Competitor] is offering me [specific deal]. Can you match or beat that?",
        "I'm looking at my usage and I think I'm on the wrong plan.",
        "These fees and charges seem excessive. Can we review them?",
        "I'm considering switching to prepaid to save money.",
        "What promotions do you have for existing customers?",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::pipeline::PromptTemplate;

    #[test]
    fn test_every_template_parses() {
        let templates = [
            ROUTER_PROMPT,
            utility::ANALYZE,
            utility::SCRIPT,
            medical::ERROR_CHECK,
            medical::NEGOTIATE,
            medical::SETTLEMENTS,
            subscription::ANALYZE,
            subscription::CANCELLATION,
            subscription::RETENTION,
            telecom::ANALYZE_PLAN,
            telecom::RESEARCH,
            telecom::SCRIPT,
        ];
        for source in templates {
            assert!(PromptTemplate::parse(source).is_ok(), "failed to parse: {source}");
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Company name used when the caller does not supply one
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Immutable bill data for one negotiation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillInput {
    /// Raw OCR text of the bill
    pub text: String,
    pub user_id: String,
    /// Amount due, `0.0` when it could not be extracted
    pub amount: f64,
    pub company: String,
}

impl BillInput {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>, amount: f64) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            amount,
            company: UNKNOWN_COMPANY.to_string(),
        }
    }

    /// Set the company, keeping the default for `None` or blank names
    #[must_use]
    pub fn with_company(mut self, company: Option<&str>) -> Self {
        if let Some(name) = company.map(str::trim).filter(|name| !name.is_empty()) {
            self.company = name.to_string();
        }
        self
    }
}

/// Fields a specialist step may own.
///
/// The set is closed so a renamed or misspelled field is a compile error
/// rather than a silently empty prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    // Utility
    NegotiationStrategy,
    Script,
    // Medical
    Errors,
    NegotiationPlan,
    SettlementOptions,
    // Subscription
    ServiceAnalysis,
    CancellationStrategy,
    RetentionOffers,
    // Telecom
    PlanAnalysis,
    CompetitorResearch,
    NegotiationScript,
}

impl StateField {
    pub const ALL: &'static [StateField] = &[
        StateField::NegotiationStrategy,
        StateField::Script,
        StateField::Errors,
        StateField::NegotiationPlan,
        StateField::SettlementOptions,
        StateField::ServiceAnalysis,
        StateField::CancellationStrategy,
        StateField::RetentionOffers,
        StateField::PlanAnalysis,
        StateField::CompetitorResearch,
        StateField::NegotiationScript,
    ];

    /// Key used in prompt templates and serialized details
    pub const fn key(self) -> &'static str {
        match self {
            Self::NegotiationStrategy => "negotiation_strategy",
            Self::Script => "script",
            Self::Errors => "errors",
            Self::NegotiationPlan => "negotiation_plan",
            Self::SettlementOptions => "settlement_options",
            Self::ServiceAnalysis => "service_analysis",
            Self::CancellationStrategy => "cancellation_strategy",
            Self::RetentionOffers => "retention_offers",
            Self::PlanAnalysis => "plan_analysis",
            Self::CompetitorResearch => "competitor_research",
            Self::NegotiationScript => "negotiation_script",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mutable state threaded through the steps of one pipeline run.
///
/// The carried bill fields are fixed at construction. Step outputs accumulate
/// in `fields`; a value can be overwritten but never removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiationState {
    pub ocr_text: String,
    pub company: String,
    pub amount: f64,
    #[serde(flatten)]
    fields: BTreeMap<StateField, String>,
}

impl NegotiationState {
    pub fn new(ocr_text: impl Into<String>, company: impl Into<String>, amount: f64) -> Self {
        Self {
            ocr_text: ocr_text.into(),
            company: company.into(),
            amount,
            fields: BTreeMap::new(),
        }
    }

    pub fn from_bill(bill: &BillInput) -> Self {
        Self::new(bill.text.clone(), bill.company.clone(), bill.amount)
    }

    pub fn get(&self, field: StateField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: StateField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Write a step output, replacing any previous value
    pub fn set(&mut self, field: StateField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn fields(&self) -> &BTreeMap<StateField, String> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_defaults_to_unknown() {
        let bill = BillInput::new("ELECTRIC BILL", "user-1", 10.0).with_company(Some("  "));
        assert_eq!(bill.company, UNKNOWN_COMPANY);

        let bill = bill.with_company(Some("City Power"));
        assert_eq!(bill.company, "City Power");
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in StateField::ALL {
            assert_eq!(StateField::from_key(field.key()), Some(*field));
        }
        assert_eq!(StateField::from_key("ocr_text"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut state = NegotiationState::new("bill", "Acme", 12.5);
        state.set(StateField::Errors, "first");
        state.set(StateField::Errors, "second");
        assert_eq!(state.get(StateField::Errors), Some("second"));
        assert_eq!(state.fields().len(), 1);
    }

    #[test]
    fn test_fields_serialize_with_snake_case_keys() {
        let mut state = NegotiationState::new("bill", "Acme", 12.5);
        state.set(StateField::CompetitorResearch, "AT&T is cheaper");
        let json = serde_json::to_value(&state).expect("state should serialize");
        assert_eq!(json["competitor_research"], "AT&T is cheaper");
        assert_eq!(json["ocr_text"], "bill");
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["amount"], 12.5);
    }
}

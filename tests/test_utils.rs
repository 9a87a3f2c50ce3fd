#![allow(dead_code)]

use async_trait::async_trait;
use hagglz::agents::MasterOrchestrator;
use hagglz::config::Config;
use hagglz::llm::{CompletionRequest, LlmClient, LlmError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Text unique to the bill classification prompt
pub const ROUTER_MARKER: &str = "determine the specialist agent category";

pub const UTILITY_BILL: &str = "CITY POWER & LIGHT\nElectric service 640 kWh\nAmount Due: $124.58";
pub const MEDICAL_BILL: &str = "GENERAL HOSPITAL\nPatient: J. Doe\nTOTAL: $2,450.00";
pub const TELECOM_BILL: &str = "VERIZON WIRELESS\nUnlimited plan, 4 lines\nBalance: $180.00";
pub const SUBSCRIPTION_BILL: &str = "NETFLIX PREMIUM\nStreaming plan\n$22.99";

/// A deterministic LLM that answers from scripted rules.
///
/// Rules are matched by prompt substring in insertion order. A prompt that
/// matches no rule is an error, so tests notice unexpected LLM calls.
#[derive(Default)]
pub struct ScriptedLlm {
    rules: Vec<(String, String)>,
    failures: Vec<String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `marker` with `response`
    pub fn respond(mut self, marker: &str, response: &str) -> Self {
        self.rules.push((marker.to_string(), response.to_string()));
        self
    }

    /// Fail prompts containing `marker` with a provider error
    pub fn fail_on(mut self, marker: &str) -> Self {
        self.failures.push(marker.to_string());
        self
    }

    /// Sleep before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_client(self) -> (Arc<Self>, Arc<dyn LlmClient>) {
        let scripted = Arc::new(self);
        let client: Arc<dyn LlmClient> = scripted.clone();
        (scripted, client)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn calls_containing(&self, marker: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.prompt.contains(marker))
            .count()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failures
            .iter()
            .any(|marker| request.prompt.contains(marker.as_str()))
        {
            return Err(LlmError::Provider("scripted failure".to_string()));
        }

        self.rules
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| LlmError::Provider("no scripted response for prompt".to_string()))
    }
}

/// Text of exactly `chars` characters built from `seed`
pub fn long_text(seed: &str, chars: usize) -> String {
    seed.chars().cycle().take(chars).collect()
}

/// A scripted LLM answering every built-in prompt with neutral text
pub fn scripted_for_all_specialists(label: &str) -> ScriptedLlm {
    ScriptedLlm::new()
        .respond(ROUTER_MARKER, label)
        // Utility
        .respond("Analyze this utility bill", "Ask for the loyalty rate.")
        .respond("negotiation script for this utility bill", "Hello, I have been a customer for years.")
        // Medical
        .respond("Analyze this medical bill", "Duplicate lab charge on line 4.")
        .respond("medical bill negotiation strategy", "Request an itemized bill and a cash discount.")
        .respond("Based on the negotiation plan", "Offer 60% as a lump sum.")
        // Subscription
        .respond("Analyze this subscription service", "Premium tier is underused.")
        .respond("cancellation-based negotiation strategy", "Threaten to cancel at renewal.")
        .respond("Based on the cancellation strategy", "Expect three months at half price.")
        // Telecom
        .respond("Analyze this telecom bill", "Two lines are idle.")
        .respond("research competitive alternatives", "T-Mobile offers the same for less.")
        .respond("comprehensive telecom negotiation script", "I would like to review my plan.")
}

/// Orchestrator over the built-in specialists and the scripted client
pub fn orchestrator(client: &Arc<dyn LlmClient>, config: &Config) -> MasterOrchestrator {
    MasterOrchestrator::from_config(client, config).expect("built-in pipelines should build")
}

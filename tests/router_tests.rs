#![allow(clippy::unwrap_used)]

use hagglz::agents::{BillRouter, Category, KeywordRouter, LlmRouter, RouterStrategy};
use hagglz::llm::{CallPolicy, ModelSettings};
use hagglz::providers::Provider;

#[path = "test_utils.rs"]
mod test_utils;
use test_utils::{
    MEDICAL_BILL, ROUTER_MARKER, SUBSCRIPTION_BILL, ScriptedLlm, TELECOM_BILL, UTILITY_BILL,
};

fn llm_router(label: &str) -> (std::sync::Arc<ScriptedLlm>, LlmRouter) {
    let (llm, client) = ScriptedLlm::new().respond(ROUTER_MARKER, label).into_client();
    let router = LlmRouter::new(
        client,
        ModelSettings::classification(Provider::OpenAI),
        CallPolicy::default(),
    )
    .unwrap();
    (llm, router)
}

#[tokio::test]
async fn test_keyword_router_matches_each_category() {
    let cases = [
        (UTILITY_BILL, Category::Utility),
        (MEDICAL_BILL, Category::Medical),
        (SUBSCRIPTION_BILL, Category::Subscription),
        (TELECOM_BILL, Category::Telecom),
    ];

    for (text, expected) in cases {
        let classification = KeywordRouter.classify(text).await.unwrap();
        assert_eq!(classification.category, expected, "bill: {text}");
        assert!(!classification.fallback);
    }
    assert_eq!(KeywordRouter.strategy(), RouterStrategy::Keyword);
}

#[tokio::test]
async fn test_keyword_router_is_case_insensitive() {
    let classification = KeywordRouter.classify("SPOTIFY FAMILY").await.unwrap();
    assert_eq!(classification.category, Category::Subscription);
    assert_eq!(classification.raw, "spotify");
}

#[tokio::test]
async fn test_llm_label_is_normalised() {
    let (llm, router) = llm_router("  telecom\n");

    let classification = router.classify(TELECOM_BILL).await.unwrap();

    assert_eq!(classification.category, Category::Telecom);
    assert!(!classification.fallback);
    assert_eq!(llm.calls(), 1);

    let request = &llm.requests()[0];
    assert!(request.prompt.contains("VERIZON WIRELESS"));
    assert_eq!(request.settings.provider, Provider::OpenAI);
    assert!(request.settings.temperature.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_llm_router_falls_back_on_unknown_label() {
    let (_llm, router) = llm_router("This looks like an energy bill.");

    let classification = router.classify(UTILITY_BILL).await.unwrap();

    assert_eq!(classification.category, Category::Utility);
    assert!(classification.fallback);
    assert_eq!(classification.raw, "This looks like an energy bill.");
}

#[tokio::test]
async fn test_llm_router_propagates_provider_errors() {
    let (_llm, client) = ScriptedLlm::new().fail_on(ROUTER_MARKER).into_client();
    let router = LlmRouter::new(
        client,
        ModelSettings::classification(Provider::Anthropic),
        CallPolicy::default(),
    )
    .unwrap();

    assert!(router.classify(MEDICAL_BILL).await.is_err());
}

#[test]
fn test_prompt_embeds_bill_text() {
    let (_llm, router) = llm_router("UTILITY");
    let prompt = router.prompt_for("ACME WATER CO");

    assert!(prompt.contains("Bill Data: ACME WATER CO"));
    assert!(prompt.contains("UTILITY, MEDICAL, SUBSCRIPTION, or TELECOM"));
}

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use hagglz::agents::Category;
use hagglz::memory::{InMemoryNegotiationMemory, NegotiationMemory, NegotiationRecord};
use std::sync::Arc;

fn record(company: &str, strategy: &str, bill_type: Category) -> NegotiationRecord {
    NegotiationRecord {
        company: company.to_string(),
        strategy: strategy.to_string(),
        bill_type,
        amount: 180.0,
        savings: 36.0,
        confidence: 0.9,
        success: true,
        outcome: Some("auto_executed".to_string()),
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_concurrent_stores_are_all_kept() {
    let memory = Arc::new(InMemoryNegotiationMemory::new());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let memory = Arc::clone(&memory);
            tokio::spawn(async move {
                memory
                    .store(record(&format!("Company {i}"), "loyalty discount", Category::Utility))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(memory.len().await, 16);
    assert!(!memory.is_empty().await);
    assert!((memory.success_rate().await - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_bill_type_filter_is_case_insensitive() {
    let memory = InMemoryNegotiationMemory::new();
    memory
        .store(record("Verizon", "quote competitor plans", Category::Telecom))
        .await
        .unwrap();
    memory
        .store(record("AT&T", "ask for retention department", Category::Telecom))
        .await
        .unwrap();
    memory
        .store(record("City Power", "quote competitor plans", Category::Utility))
        .await
        .unwrap();

    let matches = memory
        .retrieve_similar("competitor plans", 5, Some("telecom"))
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert!(
        matches
            .iter()
            .all(|m| m.metadata.bill_type == Category::Telecom)
    );
    assert_eq!(matches[0].metadata.company, "Verizon");
    assert!(matches[0].content.contains("Strategy: quote competitor plans"));
}

#[tokio::test]
async fn test_retrieval_respects_limit() {
    let memory = InMemoryNegotiationMemory::new();
    for company in ["Netflix", "Spotify", "Hulu"] {
        memory
            .store(record(company, "threaten to cancel", Category::Subscription))
            .await
            .unwrap();
    }

    let matches = memory.retrieve_similar("cancel", 2, None).await.unwrap();
    assert_eq!(matches.len(), 2);

    let none = memory
        .retrieve_similar("cancel", 5, Some("MEDICAL"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

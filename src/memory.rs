//! Negotiation memory.
//!
//! Past negotiations are recorded so similar bills can be looked up later. The
//! engine never reads memory; the API layer writes to it after a confident run
//! and reads it for statistics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agents::router::Category;
use crate::log_debug;

/// Success rate reported before anything has been recorded
pub const DEFAULT_SUCCESS_RATE: f64 = 0.75;

/// Default number of matches returned by [`NegotiationMemory::retrieve_similar`]
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;

/// One remembered negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRecord {
    pub company: String,
    pub strategy: String,
    pub bill_type: Category,
    pub amount: f64,
    pub savings: f64,
    pub confidence: f64,
    pub success: bool,
    pub outcome: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NegotiationRecord {
    /// Text indexed for similarity search
    pub fn content(&self) -> String {
        format!(
            "Company: {} Strategy: {} Outcome: {}",
            self.company,
            self.strategy,
            self.outcome.as_deref().unwrap_or("Unknown")
        )
    }
}

/// A stored negotiation matched against a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarNegotiation {
    pub content: String,
    pub metadata: NegotiationRecord,
    /// Cosine similarity in `[0, 1]`, higher is closer
    pub similarity_score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),
}

/// Similarity-search store for past negotiations
#[async_trait]
pub trait NegotiationMemory: Send + Sync {
    async fn store(&self, record: NegotiationRecord) -> Result<(), MemoryError>;

    /// Up to `k` stored negotiations ranked by similarity to `query`.
    ///
    /// With a `bill_type` filter the type label is prepended to the query and
    /// only records of that type (compared case-insensitively) are returned.
    async fn retrieve_similar(
        &self,
        query: &str,
        k: usize,
        bill_type: Option<&str>,
    ) -> Result<Vec<SimilarNegotiation>, MemoryError>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Share of stored negotiations marked successful
    async fn success_rate(&self) -> f64;
}

type TermVector = HashMap<String, f64>;

fn term_vector(text: &str) -> TermVector {
    let mut terms = TermVector::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric() && c != '&')
        .filter(|term| !term.is_empty())
    {
        *terms.entry(term.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    let norm = |v: &TermVector| v.values().map(|w| w * w).sum::<f64>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator <= f64::EPSILON {
        0.0
    } else {
        dot / denominator
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

struct IndexedRecord {
    record: NegotiationRecord,
    content: String,
    vector: TermVector,
}

/// In-process memory ranking records by term-frequency cosine similarity
#[derive(Default)]
pub struct InMemoryNegotiationMemory {
    records: RwLock<Vec<IndexedRecord>>,
}

impl InMemoryNegotiationMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NegotiationMemory for InMemoryNegotiationMemory {
    async fn store(&self, record: NegotiationRecord) -> Result<(), MemoryError> {
        let content = record.content();
        let vector = term_vector(&content);
        log_debug!("Storing {} negotiation for {}", record.bill_type, record.company);
        self.records.write().push(IndexedRecord {
            record,
            content,
            vector,
        });
        Ok(())
    }

    async fn retrieve_similar(
        &self,
        query: &str,
        k: usize,
        bill_type: Option<&str>,
    ) -> Result<Vec<SimilarNegotiation>, MemoryError> {
        let search = match bill_type {
            Some(label) => format!("{label} {query}"),
            None => query.to_string(),
        };
        let query_vector = term_vector(&search);

        let records = self.records.read();
        let mut matches: Vec<SimilarNegotiation> = records
            .iter()
            .filter(|indexed| {
                bill_type.is_none_or(|label| indexed.record.bill_type.as_ref().eq_ignore_ascii_case(label))
            })
            .map(|indexed| SimilarNegotiation {
                content: indexed.content.clone(),
                metadata: indexed.record.clone(),
                similarity_score: cosine_similarity(&query_vector, &indexed.vector),
            })
            .collect();
        drop(records);

        matches.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        matches.truncate(k);
        Ok(matches)
    }

    async fn len(&self) -> usize {
        self.records.read().len()
    }

    async fn success_rate(&self) -> f64 {
        let records = self.records.read();
        if records.is_empty() {
            return DEFAULT_SUCCESS_RATE;
        }
        let successes = records.iter().filter(|indexed| indexed.record.success).count();
        ratio(successes, records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(company: &str, strategy: &str, bill_type: Category, success: bool) -> NegotiationRecord {
        NegotiationRecord {
            company: company.to_string(),
            strategy: strategy.to_string(),
            bill_type,
            amount: 100.0,
            savings: 15.0,
            confidence: 0.8,
            success,
            outcome: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = term_vector("loyalty discount request");
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &term_vector("settlement offer")).abs() < f64::EPSILON);
        assert!(cosine_similarity(&a, &TermVector::new()).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_success_rate_defaults_when_empty() {
        let memory = InMemoryNegotiationMemory::new();
        assert!((memory.success_rate().await - DEFAULT_SUCCESS_RATE).abs() < f64::EPSILON);

        memory
            .store(record("City Power", "loyalty", Category::Utility, true))
            .await
            .expect("store");
        memory
            .store(record("General Hospital", "hardship", Category::Medical, false))
            .await
            .expect("store");
        assert!((memory.success_rate().await - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_closest_first() {
        let memory = InMemoryNegotiationMemory::new();
        memory
            .store(record("City Power", "ask for a loyalty discount", Category::Utility, true))
            .await
            .expect("store");
        memory
            .store(record("Verizon", "quote competitor plans", Category::Telecom, true))
            .await
            .expect("store");

        let matches = memory
            .retrieve_similar("loyalty discount", DEFAULT_SIMILAR_LIMIT, None)
            .await
            .expect("retrieve");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].metadata.company, "City Power");
        assert!(matches[0].similarity_score > matches[1].similarity_score);
    }
}

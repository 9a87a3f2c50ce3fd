use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::agents::confidence::ExecutionMode;
use crate::agents::orchestrator::{NegotiationOutcome, SavingsTable};
use crate::agents::router::Category;
use crate::agents::state::BillInput;
use crate::api::AppState;
use crate::memory::{NegotiationMemory, NegotiationRecord};
use crate::ocr::extract_bill_amount;
use crate::{log_debug, log_error, log_info, log_warn};

pub const SERVICE_NAME: &str = "hagglz-negotiation-api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiateRequest {
    /// Base64-encoded bill image
    pub bill_image: String,
    pub user_id: String,
    #[serde(default)]
    pub target_savings: Option<f64>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiateResponse {
    pub negotiation_id: Uuid,
    pub status: String,
    pub agent_type: Category,
    pub strategy: String,
    pub estimated_savings: f64,
    pub confidence: f64,
    pub execution_mode: ExecutionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl NegotiateResponse {
    fn from_outcome(negotiation_id: Uuid, outcome: NegotiationOutcome) -> Self {
        Self {
            negotiation_id,
            status: outcome
                .result
                .status
                .map_or_else(|| "completed".to_string(), |status| status.to_string()),
            agent_type: outcome.result.agent_type,
            strategy: outcome.result.strategy,
            estimated_savings: outcome.result.estimated_savings,
            confidence: outcome.confidence,
            execution_mode: outcome.execution_mode,
            script: outcome.script,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_negotiations: usize,
    pub average_savings: BTreeMap<Category, f64>,
    pub success_rate: f64,
}

/// Errors surfaced to API clients as `{"detail": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Negotiation failed: {0}")]
    NegotiationFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NegotiationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Decode the upload into bill input; no LLM work happens before this succeeds
fn prepare_bill(state: &AppState, request: &NegotiateRequest) -> Result<BillInput, ApiError> {
    let image = BASE64
        .decode(request.bill_image.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid bill image encoding: {e}")))?;

    let text = state
        .ocr
        .extract_text(&image)
        .map_err(|e| ApiError::BadRequest(format!("OCR processing failed: {e}")))?;
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Could not extract text from image".to_string(),
        ));
    }

    let amount = extract_bill_amount(&text);
    Ok(BillInput::new(text, request.user_id.clone(), amount)
        .with_company(request.company_name.as_deref()))
}

fn remember(memory: Arc<dyn NegotiationMemory>, bill: &BillInput, outcome: &NegotiationOutcome) {
    let record = NegotiationRecord {
        company: bill.company.clone(),
        strategy: outcome.result.strategy.clone(),
        bill_type: outcome.result.agent_type,
        amount: bill.amount,
        savings: outcome.result.estimated_savings,
        confidence: outcome.confidence,
        success: true,
        outcome: outcome.result.status.map(|status| status.to_string()),
        timestamp: Utc::now(),
    };

    tokio::spawn(async move {
        if let Err(e) = memory.store(record).await {
            log_warn!("Failed to store negotiation in memory: {}", e);
        }
    });
}

pub async fn start_negotiation(
    State(state): State<AppState>,
    Json(request): Json<NegotiateRequest>,
) -> Result<Json<NegotiateResponse>, ApiError> {
    let bill = prepare_bill(&state, &request)?;
    log_info!(
        "Negotiation requested by {} for {} (amount {:.2}, target savings {:?})",
        bill.user_id,
        bill.company,
        bill.amount,
        request.target_savings
    );

    let outcome = state.orchestrator.process_bill(&bill).await.map_err(|e| {
        log_error!("Negotiation failed for {}: {}", bill.user_id, e);
        ApiError::NegotiationFailed(e.to_string())
    })?;

    let negotiation_id = Uuid::new_v4();
    if outcome.confidence > state.store_threshold {
        remember(Arc::clone(&state.memory), &bill, &outcome);
    }

    log_debug!(
        "Negotiation {} finished: {} via {}",
        negotiation_id,
        outcome.execution_mode,
        outcome.result.agent_type
    );
    Ok(Json(NegotiateResponse::from_outcome(negotiation_id, outcome)))
}

pub async fn negotiation_status(Path(negotiation_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({
        "negotiation_id": negotiation_id,
        "status": "completed",
        "message": "Negotiation results available",
    }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        total_negotiations: state.memory.len().await,
        average_savings: SavingsTable::Historical.rates(),
        success_rate: state.memory.success_rate().await,
    })
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::RecommendationKind;

/// Success envelope for every recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    #[serde(rename = "recommendationId", skip_serializing_if = "Option::is_none")]
    pub recommendation_id: Option<Uuid>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecommendationKind>,
}

impl<T> RecommendationResponse<T> {
    pub fn new(data: Vec<T>, recommendation_id: Option<Uuid>) -> Self {
        Self {
            success: true,
            data,
            recommendation_id,
            kind: None,
        }
    }

    pub fn tagged(mut self, kind: RecommendationKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Failure envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Feedback acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(rename = "recommendationId")]
    pub recommendation_id: Uuid,
}

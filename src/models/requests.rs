use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::domain::FeedbackAction;

/// Query for teacher recommendations against one of the caller's requests
///
/// GET /api/v1/recommendations/teachers?requestId=...&limit=...
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TeacherRecommendationQuery {
    #[validate(length(min = 1))]
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Query carrying only a result limit
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LimitQuery {
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Reaction to a previously served recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "recommendationId")]
    pub recommendation_id: Uuid,
    pub action: FeedbackAction,
}

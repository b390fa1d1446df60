use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    FeedbackAction, ParseEnumError, RatingEvent, RecommendationLog, TeacherCandidate,
    TutoringRequest,
};

/// Errors that can occur when reading or writing marketplace data
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored value: {0}")]
    InvalidData(#[from] ParseEnumError),
}

/// Read access to marketplace records plus the recommendation log
///
/// Implementations return fresh snapshots on every call; the scoring code
/// never caches them.
#[allow(async_fn_in_trait)]
pub trait RecommendationStore {
    /// Fetch a tutoring request by id
    async fn find_request(&self, request_id: &str) -> Result<Option<TutoringRequest>, StoreError>;

    /// Fetch the teacher profile owned by a user
    async fn find_teacher_by_user(&self, user_id: &str)
        -> Result<Option<TeacherCandidate>, StoreError>;

    /// All teacher profiles with their review averages
    async fn list_teachers(&self) -> Result<Vec<TeacherCandidate>, StoreError>;

    /// All requests still open for applications
    async fn list_open_requests(&self) -> Result<Vec<TutoringRequest>, StoreError>;

    /// Approved parent-to-teacher ratings given by `parent_id`, plus every
    /// other approved rating with a score of at least `min_score`
    async fn ratings_for_collaborative(
        &self,
        parent_id: &str,
        min_score: u8,
    ) -> Result<Vec<RatingEvent>, StoreError>;

    /// Persist a served recommendation list
    async fn record_recommendation(&self, log: &RecommendationLog) -> Result<(), StoreError>;

    /// Attach the owner's reaction to a logged recommendation
    ///
    /// Returns false when no log with that id belongs to `user_id`.
    async fn record_feedback(
        &self,
        recommendation_id: Uuid,
        user_id: &str,
        action: FeedbackAction,
    ) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

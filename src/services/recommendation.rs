use thiserror::Error;
use uuid::Uuid;

use crate::core::{
    collaborative::{recommend_for_parent, CollaborativeRecommendation},
    ranker::{Candidate, RankResult, Ranker},
};
use crate::models::{
    FeedbackAction, RecommendationKind, RecommendationLog, RecommendedItem, ScoredCandidate,
    TeacherCandidate, TutoringRequest,
};
use crate::services::store::{RecommendationStore, StoreError};

/// Errors surfaced by the recommendation endpoints
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("No teacher profile for user: {0}")]
    TeacherNotFound(String),

    #[error("Recommendation not found: {0}")]
    RecommendationNotFound(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Ranked list plus the id under which it was logged
#[derive(Debug)]
pub struct Recommendations<T> {
    pub items: Vec<ScoredCandidate<T>>,
    /// `None` when the log write failed
    pub recommendation_id: Option<Uuid>,
    pub total_candidates: usize,
}

#[derive(Debug)]
pub struct CollaborativeRecommendations {
    pub kind: RecommendationKind,
    pub items: Vec<CollaborativeRecommendation>,
    pub recommendation_id: Option<Uuid>,
}

/// Fetches snapshots from the store, runs the pure ranking code on them and
/// logs what was served
pub struct RecommendationService<S> {
    store: S,
    ranker: Ranker,
}

impl<S: RecommendationStore> RecommendationService<S> {
    pub fn new(store: S, ranker: Ranker) -> Self {
        Self { store, ranker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Rank teachers for one of the caller's own requests
    pub async fn teachers_for_request(
        &self,
        parent_id: &str,
        request_id: &str,
        limit: usize,
    ) -> Result<Recommendations<TeacherCandidate>, RecommendError> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .filter(|r| r.parent_id == parent_id)
            .ok_or_else(|| RecommendError::RequestNotFound(request_id.to_string()))?;

        let teachers = self.store.list_teachers().await?;
        let result = self.ranker.rank_teachers(&request, teachers, limit);

        tracing::info!(
            "Teachers recommended for request {}: {} of {} candidates",
            request_id,
            result.ranked.len(),
            result.total_candidates
        );

        Ok(self
            .finish(parent_id, Some(request_id.to_string()), result)
            .await)
    }

    /// Rank open requests for the caller's teacher profile
    pub async fn requests_for_teacher(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Recommendations<TutoringRequest>, RecommendError> {
        let teacher = self
            .store
            .find_teacher_by_user(user_id)
            .await?
            .ok_or_else(|| RecommendError::TeacherNotFound(user_id.to_string()))?;

        let requests = self.store.list_open_requests().await?;
        let result = self.ranker.rank_requests(&teacher, requests, limit);

        tracing::info!(
            "Requests recommended for teacher {}: {} of {} candidates",
            teacher.id,
            result.ranked.len(),
            result.total_candidates
        );

        Ok(self.finish(user_id, None, result).await)
    }

    /// Collaborative teacher list for a parent, top rated when the parent has
    /// no positive rating yet
    pub async fn collaborative_for_parent(
        &self,
        parent_id: &str,
        limit: usize,
    ) -> Result<CollaborativeRecommendations, RecommendError> {
        let params = self.ranker.params();
        let ratings = self
            .store
            .ratings_for_collaborative(parent_id, params.positive_rating)
            .await?;
        let teachers = self.store.list_teachers().await?;

        let outcome = recommend_for_parent(parent_id, &ratings, teachers, params, limit);

        tracing::info!(
            "Teachers recommended by {} for parent {}: {}",
            outcome.kind,
            parent_id,
            outcome.recommendations.len()
        );

        let items = outcome
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, r)| RecommendedItem {
                item_id: r.teacher.id.clone(),
                score: r.score,
                rank: i as u32 + 1,
            })
            .collect();
        let log = RecommendationLog::new(parent_id, outcome.kind, None, items);
        let recommendation_id = self.log(&log).await;

        Ok(CollaborativeRecommendations {
            kind: outcome.kind,
            items: outcome.recommendations,
            recommendation_id,
        })
    }

    /// Record the caller's reaction to a served list
    pub async fn record_feedback(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
        action: FeedbackAction,
    ) -> Result<(), RecommendError> {
        let found = self
            .store
            .record_feedback(recommendation_id, user_id, action)
            .await?;

        if !found {
            return Err(RecommendError::RecommendationNotFound(recommendation_id));
        }

        tracing::debug!(
            "Feedback {} recorded on {} by {}",
            action,
            recommendation_id,
            user_id
        );
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }

    async fn finish<T: Candidate>(
        &self,
        user_id: &str,
        reference_id: Option<String>,
        result: RankResult<T>,
    ) -> Recommendations<T> {
        let items = result
            .ranked
            .iter()
            .enumerate()
            .map(|(i, scored)| RecommendedItem {
                item_id: scored.candidate.candidate_id().to_string(),
                score: scored.total_score,
                rank: i as u32 + 1,
            })
            .collect();
        let log = RecommendationLog::new(user_id, result.direction.into(), reference_id, items);
        let recommendation_id = self.log(&log).await;

        Recommendations {
            items: result.ranked,
            recommendation_id,
            total_candidates: result.total_candidates,
        }
    }

    /// Best-effort: a failed log write does not fail the recommendation
    async fn log(&self, log: &RecommendationLog) -> Option<Uuid> {
        match self.store.record_recommendation(log).await {
            Ok(()) => Some(log.id),
            Err(e) => {
                tracing::warn!("Failed to log recommendation for {}: {}", log.user_id, e);
                None
            }
        }
    }
}

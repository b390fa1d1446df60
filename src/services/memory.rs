use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    FeedbackAction, RatingEvent, RecommendationLog, TeacherCandidate, TutoringRequest,
};
use crate::services::store::{RecommendationStore, StoreError};

/// In-process store backed by vectors
///
/// Used by the test suites and for running the HTTP surface without a
/// database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    requests: RwLock<Vec<TutoringRequest>>,
    teachers: RwLock<Vec<TeacherCandidate>>,
    ratings: RwLock<Vec<RatingEvent>>,
    logs: RwLock<Vec<RecommendationLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requests(self, requests: Vec<TutoringRequest>) -> Self {
        Self {
            requests: RwLock::new(requests),
            ..self
        }
    }

    pub fn with_teachers(self, teachers: Vec<TeacherCandidate>) -> Self {
        Self {
            teachers: RwLock::new(teachers),
            ..self
        }
    }

    pub fn with_ratings(self, ratings: Vec<RatingEvent>) -> Self {
        Self {
            ratings: RwLock::new(ratings),
            ..self
        }
    }

    /// Snapshot of every logged recommendation
    pub async fn logs(&self) -> Vec<RecommendationLog> {
        self.logs.read().await.clone()
    }
}

impl RecommendationStore for MemoryStore {
    async fn find_request(&self, request_id: &str) -> Result<Option<TutoringRequest>, StoreError> {
        Ok(self
            .requests
            .read()
            .await
            .iter()
            .find(|r| r.id == request_id)
            .cloned())
    }

    async fn find_teacher_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TeacherCandidate>, StoreError> {
        Ok(self
            .teachers
            .read()
            .await
            .iter()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_teachers(&self) -> Result<Vec<TeacherCandidate>, StoreError> {
        Ok(self.teachers.read().await.clone())
    }

    async fn list_open_requests(&self) -> Result<Vec<TutoringRequest>, StoreError> {
        Ok(self
            .requests
            .read()
            .await
            .iter()
            .filter(|r| r.is_open())
            .cloned()
            .collect())
    }

    async fn ratings_for_collaborative(
        &self,
        parent_id: &str,
        min_score: u8,
    ) -> Result<Vec<RatingEvent>, StoreError> {
        Ok(self
            .ratings
            .read()
            .await
            .iter()
            .filter(|r| r.rater_id == parent_id || r.score >= min_score)
            .cloned()
            .collect())
    }

    async fn record_recommendation(&self, log: &RecommendationLog) -> Result<(), StoreError> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn record_feedback(
        &self,
        recommendation_id: Uuid,
        user_id: &str,
        action: FeedbackAction,
    ) -> Result<bool, StoreError> {
        let mut logs = self.logs.write().await;
        match logs
            .iter_mut()
            .find(|log| log.id == recommendation_id && log.user_id == user_id)
        {
            Some(log) => {
                log.user_action = Some(action);
                log.feedback_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationKind;

    #[tokio::test]
    async fn test_feedback_requires_owner() {
        let store = MemoryStore::new();
        let log = RecommendationLog::new("parent-1", RecommendationKind::TopRated, None, vec![]);
        store.record_recommendation(&log).await.unwrap();

        assert!(!store
            .record_feedback(log.id, "parent-2", FeedbackAction::Like)
            .await
            .unwrap());
        assert!(store
            .record_feedback(log.id, "parent-1", FeedbackAction::Like)
            .await
            .unwrap());

        let logs = store.logs().await;
        assert_eq!(logs[0].user_action, Some(FeedbackAction::Like));
        assert!(logs[0].feedback_at.is_some());
    }
}

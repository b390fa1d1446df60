use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::models::{
    AccountStatus, Availability, FeedbackAction, Location, RatingEvent, RecommendationLog,
    RequestStatus, SubjectOffering, TeacherCandidate, TeacherPreference, TutoringRequest,
};
use crate::services::store::{RecommendationStore, StoreError};

const REQUEST_COLUMNS: &str = r#"
    id, parent_id, subject, grade, price, latitude, longitude,
    status, teacher_preferences, created_at
"#;

/// Teacher profiles joined with the average of their approved ratings
const TEACHER_SELECT: &str = r#"
    SELECT
        t.id, t.user_id, t.display_name, t.latitude, t.longitude, t.subjects,
        t.hourly_rate, t.success_count, t.account_status, t.availability,
        t.attributes, r.review_average
    FROM teacher_profiles t
    LEFT JOIN (
        SELECT ratee_id, AVG(score)::DOUBLE PRECISION AS review_average
        FROM ratings
        WHERE kind = 'parent_to_teacher' AND status = 'normal'
        GROUP BY ratee_id
    ) r ON r.ratee_id = t.id
"#;

/// PostgreSQL-backed marketplace store
///
/// Reads requests, teacher profiles and ratings written by the rest of the
/// marketplace, and owns the `recommendation_logs` table.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

impl RecommendationStore for PostgresStore {
    async fn find_request(&self, request_id: &str) -> Result<Option<TutoringRequest>, StoreError> {
        let query = format!("SELECT {} FROM tutoring_requests WHERE id = $1", REQUEST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn find_teacher_by_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TeacherCandidate>, StoreError> {
        let query = format!("{} WHERE t.user_id = $1", TEACHER_SELECT);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(teacher_from_row).transpose()
    }

    async fn list_teachers(&self) -> Result<Vec<TeacherCandidate>, StoreError> {
        let rows = sqlx::query(TEACHER_SELECT).fetch_all(&self.pool).await?;

        tracing::debug!("Loaded {} teacher profiles", rows.len());

        rows.iter().map(teacher_from_row).collect()
    }

    async fn list_open_requests(&self) -> Result<Vec<TutoringRequest>, StoreError> {
        let query = format!(
            "SELECT {} FROM tutoring_requests WHERE status = 'open'",
            REQUEST_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        tracing::debug!("Loaded {} open requests", rows.len());

        rows.iter().map(request_from_row).collect()
    }

    async fn ratings_for_collaborative(
        &self,
        parent_id: &str,
        min_score: u8,
    ) -> Result<Vec<RatingEvent>, StoreError> {
        let query = r#"
            SELECT id, rater_id, ratee_id, score, created_at
            FROM ratings
            WHERE kind = 'parent_to_teacher'
              AND status = 'normal'
              AND (rater_id = $1 OR score >= $2)
        "#;

        let rows = sqlx::query(query)
            .bind(parent_id)
            .bind(min_score as i16)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<RatingEvent, StoreError> {
                let score: i16 = row.try_get("score")?;
                Ok(RatingEvent {
                    id: row.try_get("id")?,
                    rater_id: row.try_get("rater_id")?,
                    ratee_id: row.try_get("ratee_id")?,
                    score: score.clamp(0, u8::MAX as i16) as u8,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Uses INSERT ... ON CONFLICT so a retried write is harmless.
    async fn record_recommendation(&self, log: &RecommendationLog) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO recommendation_logs (id, user_id, kind, reference_id, items, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
        "#;

        sqlx::query(query)
            .bind(log.id)
            .bind(&log.user_id)
            .bind(log.kind.as_str())
            .bind(&log.reference_id)
            .bind(Json(&log.items))
            .bind(log.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded recommendation {} for {} ({} items)",
            log.id,
            log.user_id,
            log.items.len()
        );

        Ok(())
    }

    async fn record_feedback(
        &self,
        recommendation_id: Uuid,
        user_id: &str,
        action: FeedbackAction,
    ) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE recommendation_logs
            SET user_action = $3, feedback_at = NOW()
            WHERE id = $1 AND user_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(recommendation_id)
            .bind(user_id)
            .bind(action.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn location_from_row(row: &PgRow) -> Result<Option<Location>, StoreError> {
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;

    Ok(latitude
        .zip(longitude)
        .map(|(lat, lon)| Location::new(lat, lon)))
}

fn request_from_row(row: &PgRow) -> Result<TutoringRequest, StoreError> {
    let status: String = row.try_get("status")?;
    let Json(teacher_preferences): Json<Vec<TeacherPreference>> =
        row.try_get("teacher_preferences")?;

    Ok(TutoringRequest {
        id: row.try_get("id")?,
        parent_id: row.try_get("parent_id")?,
        subject: row.try_get("subject")?,
        grade: row.try_get("grade")?,
        price: row.try_get("price")?,
        location: location_from_row(row)?,
        status: status.parse::<RequestStatus>()?,
        teacher_preferences,
        created_at: row.try_get("created_at")?,
    })
}

fn teacher_from_row(row: &PgRow) -> Result<TeacherCandidate, StoreError> {
    let account_status: String = row.try_get("account_status")?;
    let availability: String = row.try_get("availability")?;
    let success_count: i32 = row.try_get("success_count")?;
    let Json(subjects): Json<Vec<SubjectOffering>> = row.try_get("subjects")?;
    let Json(attributes): Json<BTreeMap<String, String>> = row.try_get("attributes")?;

    Ok(TeacherCandidate {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        display_name: row.try_get("display_name")?,
        location: location_from_row(row)?,
        subjects,
        hourly_rate: row.try_get("hourly_rate")?,
        review_average: row.try_get("review_average")?,
        success_count: success_count.max(0) as u32,
        account_status: account_status.parse::<AccountStatus>()?,
        availability: availability.parse::<Availability>()?,
        attributes,
    })
}

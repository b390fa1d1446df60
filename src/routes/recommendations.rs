use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::config::MatchingSettings;
use crate::models::{
    FeedbackRequest, FeedbackResponse, HealthResponse, LimitQuery, RecommendationResponse,
    TeacherRecommendationQuery,
};
use crate::routes::BadRequest;
use crate::services::{RecommendationService, RecommendationStore};

/// Application state shared across all handlers
pub struct AppState<S> {
    pub service: Arc<RecommendationService<S>>,
    pub matching: MatchingSettings,
}

impl<S> AppState<S> {
    pub fn new(service: RecommendationService<S>, matching: MatchingSettings) -> Self {
        Self {
            service: Arc::new(service),
            matching,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            matching: self.matching.clone(),
        }
    }
}

/// Configure all recommendation routes
pub fn configure<S: RecommendationStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check::<S>))
        .route("/recommendations/teachers", web::get().to(recommend_teachers::<S>))
        .route(
            "/recommendations/teachers/collaborative",
            web::get().to(collaborative_teachers::<S>),
        )
        .route("/recommendations/requests", web::get().to(recommend_requests::<S>))
        .route("/recommendations/feedback", web::post().to(submit_feedback::<S>));
}

/// Requested limit checked against the configured maximum, or the default
fn resolve_limit<S>(state: &AppState<S>, requested: Option<u16>) -> Result<usize, BadRequest> {
    let max_limit = state.matching.max_limit;
    match requested {
        Some(limit) if usize::from(limit) > max_limit => Err(BadRequest(format!(
            "Validation failed: limit must be between 1 and {}",
            max_limit
        ))),
        _ => Ok(state.matching.effective_limit(requested)),
    }
}

fn validate<T: Validate>(value: &T) -> Result<(), BadRequest> {
    value.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        BadRequest(format!("Validation failed: {}", errors))
    })
}

/// Health check endpoint
async fn health_check<S: RecommendationStore>(state: web::Data<AppState<S>>) -> HttpResponse {
    let status = if state.service.health_check().await {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommend teachers for one of the caller's requests
///
/// GET /api/v1/recommendations/teachers?requestId={id}&limit={1..max_limit}
async fn recommend_teachers<S: RecommendationStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    query: web::Query<TeacherRecommendationQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    validate(&*query)?;
    let limit = resolve_limit(&state, query.limit)?;

    let result = state
        .service
        .teachers_for_request(&user.user_id, &query.request_id, limit)
        .await?;

    Ok(HttpResponse::Ok().json(RecommendationResponse::new(
        result.items,
        result.recommendation_id,
    )))
}

/// Recommend open requests for the caller's teacher profile
///
/// GET /api/v1/recommendations/requests?limit={1..max_limit}
async fn recommend_requests<S: RecommendationStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    validate(&*query)?;
    let limit = resolve_limit(&state, query.limit)?;

    let result = state
        .service
        .requests_for_teacher(&user.user_id, limit)
        .await?;

    Ok(HttpResponse::Ok().json(RecommendationResponse::new(
        result.items,
        result.recommendation_id,
    )))
}

/// Collaborative teacher recommendations for the calling parent
///
/// GET /api/v1/recommendations/teachers/collaborative?limit={1..max_limit}
///
/// The response carries `type`: `top_rated` or `collaborative`.
async fn collaborative_teachers<S: RecommendationStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    validate(&*query)?;
    let limit = resolve_limit(&state, query.limit)?;

    let result = state
        .service
        .collaborative_for_parent(&user.user_id, limit)
        .await?;

    Ok(HttpResponse::Ok().json(
        RecommendationResponse::new(result.items, result.recommendation_id).tagged(result.kind),
    ))
}

/// Record the caller's reaction to a served recommendation
///
/// POST /api/v1/recommendations/feedback
///
/// Request body:
/// ```json
/// {
///   "recommendationId": "uuid",
///   "action": "click|ignore|like|dislike"
/// }
/// ```
async fn submit_feedback<S: RecommendationStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    body: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    state
        .service
        .record_feedback(&user.user_id, body.recommendation_id, body.action)
        .await?;

    Ok(HttpResponse::Ok().json(FeedbackResponse {
        success: true,
        recommendation_id: body.recommendation_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_token, Role, TokenVerifier};
    use crate::core::Ranker;
    use crate::models::{
        AccountStatus, Availability, Location, RatingEvent, RequestStatus, SubjectOffering,
        TeacherCandidate, TutoringRequest,
    };
    use crate::routes::{configure_extractors, configure_routes};
    use crate::services::MemoryStore;
    use actix_web::{http::header, http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    const SECRET: &str = "test-secret";

    fn teacher(id: &str, user_id: &str, lat: f64, availability: Availability) -> TeacherCandidate {
        TeacherCandidate {
            id: id.to_string(),
            user_id: user_id.to_string(),
            display_name: format!("Teacher {}", id),
            location: Some(Location::new(lat, 0.0)),
            subjects: vec![SubjectOffering::new("Math", ["G8"])],
            hourly_rate: 100.0,
            review_average: Some(4.0),
            success_count: 5,
            account_status: AccountStatus::Active,
            availability,
            attributes: BTreeMap::new(),
        }
    }

    fn request(id: &str, parent_id: &str) -> TutoringRequest {
        TutoringRequest {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            subject: "Math".to_string(),
            grade: "G8".to_string(),
            price: 100.0,
            location: Some(Location::new(0.0, 0.0)),
            status: RequestStatus::Open,
            teacher_preferences: vec![],
            created_at: None,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_requests(vec![request("req-1", "parent-1"), request("req-2", "parent-2")])
            .with_teachers(vec![
                teacher("t-far", "user-far", 0.03, Availability::Available),
                teacher("t-near", "user-near", 0.001, Availability::Available),
                teacher("t-offline", "user-offline", 0.0, Availability::Offline),
            ])
    }

    fn bearer(user_id: &str, role: Role) -> (header::HeaderName, String) {
        let token = issue_token(SECRET, user_id, role, 3600).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    macro_rules! init_app {
        ($store:expr) => {
            init_app!($store, MatchingSettings::default())
        };
        ($store:expr, $matching:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::new(
                        RecommendationService::new($store, Ranker::with_default_weights()),
                        $matching,
                    )))
                    .app_data(web::Data::new(TokenVerifier::new(SECRET)))
                    .configure(configure_extractors)
                    .configure(configure_routes::<MemoryStore>),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-1")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn test_teachers_for_own_request() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-1&limit=5")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], json!(true));
        assert!(body["recommendationId"].is_string());
        assert!(body.get("type").is_none());
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["candidate"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["t-near", "t-far"]);
        assert_eq!(body["data"][0]["scores"]["subject"], json!(1.0));
    }

    #[actix_web::test]
    async fn test_foreign_request_is_not_found() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-2")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_limit_out_of_range_is_bad_request() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-1&limit=0")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_limit_above_configured_max_is_bad_request() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-1&limit=51")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn test_raised_max_limit_accepts_larger_limit() {
        let matching = MatchingSettings {
            max_limit: 100,
            ..MatchingSettings::default()
        };
        let app = init_app!(store(), matching);

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers/collaborative?limit=60")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_requests_for_teacher() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/requests")
            .insert_header(bearer("user-near", Role::Teacher))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert!(body["data"][0]["scores"].get("preference").is_some());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/requests")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_collaborative_type_tag() {
        let ratings = vec![
            RatingEvent {
                id: "r1".to_string(),
                rater_id: "parent-1".to_string(),
                ratee_id: "t-near".to_string(),
                score: 5,
                created_at: chrono::Utc::now(),
            },
            RatingEvent {
                id: "r2".to_string(),
                rater_id: "parent-2".to_string(),
                ratee_id: "t-near".to_string(),
                score: 4,
                created_at: chrono::Utc::now(),
            },
            RatingEvent {
                id: "r3".to_string(),
                rater_id: "parent-2".to_string(),
                ratee_id: "t-far".to_string(),
                score: 5,
                created_at: chrono::Utc::now(),
            },
        ];
        let app = init_app!(store().with_ratings(ratings));

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers/collaborative")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], json!("collaborative"));
        assert_eq!(body["data"][0]["teacher"]["id"], json!("t-far"));
        assert_eq!(body["data"][0]["score"], json!(5.0));

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers/collaborative")
            .insert_header(bearer("parent-3", Role::Parent))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], json!("top_rated"));
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_feedback_on_served_recommendation() {
        let app = init_app!(store());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/teachers?requestId=req-1")
            .insert_header(bearer("parent-1", Role::Parent))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let recommendation_id = body["recommendationId"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations/feedback")
            .insert_header(bearer("parent-1", Role::Parent))
            .set_json(json!({ "recommendationId": recommendation_id, "action": "click" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations/feedback")
            .insert_header(bearer("parent-2", Role::Parent))
            .set_json(json!({ "recommendationId": recommendation_id, "action": "like" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invalid_feedback_action_is_bad_request() {
        let app = init_app!(store());

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations/feedback")
            .insert_header(bearer("parent-1", Role::Parent))
            .set_json(json!({ "recommendationId": uuid::Uuid::new_v4(), "action": "share" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = init_app!(store());

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], json!("healthy"));
    }
}

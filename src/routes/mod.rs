// Route exports
pub mod recommendations;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};

use crate::auth::AuthError;
use crate::models::ErrorResponse;
use crate::services::{RecommendError, RecommendationStore};

pub use recommendations::AppState;

pub fn configure_routes<S: RecommendationStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(recommendations::configure::<S>));
}

/// Attach the JSON and query error handlers that produce the failure envelope
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error));
}

/// Error raised by the extractors, rendered as the failure envelope
#[derive(Debug)]
pub struct BadRequest(String);

impl std::fmt::Display for BadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ResponseError for BadRequest {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ErrorResponse::new(self.0.clone()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    req: &HttpRequest,
) -> error::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    BadRequest(format!("Invalid query: {}", err)).into()
}

impl ResponseError for RecommendError {
    fn status_code(&self) -> StatusCode {
        match self {
            RecommendError::RequestNotFound(_)
            | RecommendError::TeacherNotFound(_)
            | RecommendError::RecommendationNotFound(_) => StatusCode::NOT_FOUND,
            RecommendError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            RecommendError::Store(e) => {
                tracing::error!("Recommendation failed: {}", e);
                "Recommendation failed".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(message))
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, AuthError::NotConfigured) {
            tracing::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

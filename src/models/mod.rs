// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AccountStatus, Availability, FeedbackAction, Location, MatchingParams, ParseEnumError,
    RatingEvent, RecommendationKind, RecommendationLog, RecommendedItem, RequestStatus,
    RequestWeights, ScoreBreakdown, ScoredCandidate, SubScore, SubjectOffering, TeacherCandidate,
    TeacherPreference, TeacherWeights, TutoringRequest, WeightError, WeightTable,
    WEIGHT_SUM_TOLERANCE,
};
pub use requests::{FeedbackRequest, LimitQuery, TeacherRecommendationQuery};
pub use responses::{ErrorResponse, FeedbackResponse, HealthResponse, RecommendationResponse};

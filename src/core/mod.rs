// Core algorithm exports
pub mod collaborative;
pub mod distance;
pub mod matchers;
pub mod ranker;
pub mod scoring;

pub use collaborative::{
    recommend_for_parent, top_rated, CollaborativeOutcome, CollaborativeRecommendation,
};
pub use distance::{distance_between, haversine_distance, EARTH_RADIUS_M};
pub use matchers::{
    grade_score, location_score, preference_score, price_score, review_score, subject_score,
    success_score,
};
pub use ranker::{Candidate, Direction, RankResult, Ranker, DEFAULT_LIMIT};
pub use scoring::{aggregate, score_request_for_teacher, score_teacher_for_request, PairScore};

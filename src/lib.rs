//! tutor-match - recommendation service for a tutoring marketplace
//!
//! Ranks teachers for a parent's request, open requests for a teacher, and
//! teachers liked by similar parents. Scoring is a pure weighted sum over
//! fetched snapshots; data access sits behind [`services::RecommendationStore`].

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{haversine_distance, recommend_for_parent, Ranker};
pub use models::{
    RequestWeights, ScoredCandidate, TeacherCandidate, TeacherWeights, TutoringRequest,
};

//! Collaborative teacher recommendations for repeat parents.
//!
//! Parents who liked the same teachers as the requester are "similar
//! parents"; the teachers they liked, weighted by how similar they are, form
//! the recommendation. Parents without any positive rating get the top-rated
//! teachers instead.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::{matchers::is_eligible_teacher, ranker::by_score_then_id};
use crate::models::{MatchingParams, RatingEvent, RecommendationKind, TeacherCandidate};

/// One recommended teacher with its popularity (or review average for the
/// top-rated fallback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborativeRecommendation {
    pub teacher: TeacherCandidate,
    pub score: f64,
}

#[derive(Debug)]
pub struct CollaborativeOutcome {
    /// `TopRated` or `Collaborative`
    pub kind: RecommendationKind,
    pub recommendations: Vec<CollaborativeRecommendation>,
}

/// A parent sharing positive ratings with the requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarParent {
    pub parent_id: String,
    /// Number of teachers both rated positively
    pub similarity: u32,
}

/// Recommend teachers for `parent_id` from the rating history
///
/// `ratings` must contain the requester's own ratings and the positive
/// ratings of everybody else; `teachers` is the teacher snapshot used for
/// eligibility and for the returned details.
pub fn recommend_for_parent(
    parent_id: &str,
    ratings: &[RatingEvent],
    teachers: Vec<TeacherCandidate>,
    params: &MatchingParams,
    limit: usize,
) -> CollaborativeOutcome {
    let liked: BTreeSet<&str> = ratings
        .iter()
        .filter(|r| r.rater_id == parent_id && r.score >= params.positive_rating)
        .map(|r| r.ratee_id.as_str())
        .collect();

    if liked.is_empty() {
        tracing::debug!("Parent {} has no positive ratings, using top rated", parent_id);
        return CollaborativeOutcome {
            kind: RecommendationKind::TopRated,
            recommendations: top_rated(teachers, limit),
        };
    }

    let similar = similar_parents(parent_id, &liked, ratings, params);
    tracing::debug!("Parent {} has {} similar parents", parent_id, similar.len());

    let already_rated: BTreeSet<&str> = ratings
        .iter()
        .filter(|r| r.rater_id == parent_id)
        .map(|r| r.ratee_id.as_str())
        .collect();

    let popularity = popularity_by_teacher(&similar, &already_rated, ratings, params);

    let mut recommendations: Vec<CollaborativeRecommendation> = teachers
        .into_iter()
        .filter(is_eligible_teacher)
        .filter_map(|teacher| {
            popularity
                .get(teacher.id.as_str())
                .map(|&score| CollaborativeRecommendation { teacher, score })
        })
        .collect();

    sort_and_truncate(&mut recommendations, limit);

    CollaborativeOutcome {
        kind: RecommendationKind::Collaborative,
        recommendations,
    }
}

/// Eligible teachers by review average, highest first
pub fn top_rated(
    teachers: Vec<TeacherCandidate>,
    limit: usize,
) -> Vec<CollaborativeRecommendation> {
    let mut recommendations: Vec<CollaborativeRecommendation> = teachers
        .into_iter()
        .filter(is_eligible_teacher)
        .map(|teacher| {
            let score = teacher.review_average.filter(|v| v.is_finite()).unwrap_or(0.0);
            CollaborativeRecommendation { teacher, score }
        })
        .collect();

    sort_and_truncate(&mut recommendations, limit);
    recommendations
}

/// Other parents who rated positively at least one teacher in `liked`,
/// most similar first, capped at `params.max_similar_parents`
pub fn similar_parents(
    parent_id: &str,
    liked: &BTreeSet<&str>,
    ratings: &[RatingEvent],
    params: &MatchingParams,
) -> Vec<SimilarParent> {
    let mut overlaps: HashMap<&str, BTreeSet<&str>> = HashMap::new();

    for rating in ratings {
        if rating.rater_id != parent_id
            && rating.score >= params.positive_rating
            && liked.contains(rating.ratee_id.as_str())
        {
            overlaps
                .entry(rating.rater_id.as_str())
                .or_default()
                .insert(rating.ratee_id.as_str());
        }
    }

    let mut similar: Vec<SimilarParent> = overlaps
        .into_iter()
        .map(|(parent, teachers)| SimilarParent {
            parent_id: parent.to_string(),
            similarity: teachers.len() as u32,
        })
        .collect();

    similar.sort_by(|a, b| {
        b.similarity
            .cmp(&a.similarity)
            .then_with(|| a.parent_id.cmp(&b.parent_id))
    });
    similar.truncate(params.max_similar_parents);
    similar
}

/// Σ(similarity × rating) per teacher over the similar parents' positive
/// ratings, skipping teachers the requester already rated
fn popularity_by_teacher<'a>(
    similar: &[SimilarParent],
    already_rated: &BTreeSet<&str>,
    ratings: &'a [RatingEvent],
    params: &MatchingParams,
) -> HashMap<&'a str, f64> {
    let weights: HashMap<&str, u32> = similar
        .iter()
        .map(|p| (p.parent_id.as_str(), p.similarity))
        .collect();

    let mut popularity: HashMap<&str, f64> = HashMap::new();

    for rating in ratings {
        if rating.score < params.positive_rating
            || already_rated.contains(rating.ratee_id.as_str())
        {
            continue;
        }
        if let Some(&similarity) = weights.get(rating.rater_id.as_str()) {
            *popularity.entry(rating.ratee_id.as_str()).or_insert(0.0) +=
                similarity as f64 * rating.score as f64;
        }
    }

    popularity
}

fn sort_and_truncate(recommendations: &mut Vec<CollaborativeRecommendation>, limit: usize) {
    recommendations
        .sort_by(|a, b| by_score_then_id(a.score, &a.teacher.id, b.score, &b.teacher.id));
    recommendations.truncate(limit);
}

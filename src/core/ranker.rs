use std::cmp::Ordering;

use crate::core::{
    matchers::{is_eligible_request, is_eligible_teacher},
    scoring::{score_request_for_teacher, score_teacher_for_request, PairScore},
};
use crate::models::{
    MatchingParams, RecommendationKind, RequestWeights, ScoredCandidate, TeacherCandidate,
    TeacherWeights, TutoringRequest,
};

/// Default number of ranked results
pub const DEFAULT_LIMIT: usize = 10;

/// Which side is being ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TeacherForRequest,
    RequestForTeacher,
}

impl From<Direction> for RecommendationKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::TeacherForRequest => RecommendationKind::TeacherForRequest,
            Direction::RequestForTeacher => RecommendationKind::RequestForTeacher,
        }
    }
}

/// Something the ranker can filter and order
pub trait Candidate {
    fn candidate_id(&self) -> &str;

    fn is_eligible(&self) -> bool;
}

impl Candidate for TeacherCandidate {
    fn candidate_id(&self) -> &str {
        &self.id
    }

    fn is_eligible(&self) -> bool {
        is_eligible_teacher(self)
    }
}

impl Candidate for TutoringRequest {
    fn candidate_id(&self) -> &str {
        &self.id
    }

    fn is_eligible(&self) -> bool {
        is_eligible_request(self)
    }
}

/// Result of a ranking pass
#[derive(Debug)]
pub struct RankResult<T> {
    pub direction: Direction,
    pub ranked: Vec<ScoredCandidate<T>>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
}

/// Ranking orchestrator
///
/// # Pipeline Stages
/// 1. Eligibility filter (available teacher / open request)
/// 2. Sub-score computation and weighted aggregation
/// 3. Descending sort, ties by candidate id ascending
/// 4. Truncation to the requested limit
#[derive(Debug, Clone)]
pub struct Ranker {
    teacher_weights: TeacherWeights,
    request_weights: RequestWeights,
    params: MatchingParams,
}

impl Ranker {
    pub fn new(
        teacher_weights: TeacherWeights,
        request_weights: RequestWeights,
        params: MatchingParams,
    ) -> Self {
        Self {
            teacher_weights,
            request_weights,
            params,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(
            TeacherWeights::default(),
            RequestWeights::default(),
            MatchingParams::default(),
        )
    }

    pub fn params(&self) -> &MatchingParams {
        &self.params
    }

    pub fn teacher_weights(&self) -> &TeacherWeights {
        &self.teacher_weights
    }

    pub fn request_weights(&self) -> &RequestWeights {
        &self.request_weights
    }

    /// Rank teachers for a parent's request
    pub fn rank_teachers(
        &self,
        request: &TutoringRequest,
        candidates: Vec<TeacherCandidate>,
        limit: usize,
    ) -> RankResult<TeacherCandidate> {
        rank_by(Direction::TeacherForRequest, candidates, limit, |teacher| {
            score_teacher_for_request(teacher, request, &self.teacher_weights, &self.params)
        })
    }

    /// Rank open requests for a teacher
    pub fn rank_requests(
        &self,
        teacher: &TeacherCandidate,
        candidates: Vec<TutoringRequest>,
        limit: usize,
    ) -> RankResult<TutoringRequest> {
        rank_by(Direction::RequestForTeacher, candidates, limit, |request| {
            score_request_for_teacher(request, teacher, &self.request_weights, &self.params)
        })
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn rank_by<T, F>(direction: Direction, candidates: Vec<T>, limit: usize, score: F) -> RankResult<T>
where
    T: Candidate,
    F: Fn(&T) -> PairScore,
{
    let total_candidates = candidates.len();

    let mut ranked: Vec<ScoredCandidate<T>> = candidates
        .into_iter()
        .filter(|candidate| candidate.is_eligible())
        .map(|candidate| {
            let PairScore {
                breakdown,
                total,
                distance_meters,
            } = score(&candidate);

            ScoredCandidate {
                candidate,
                scores: breakdown,
                total_score: total,
                distance_meters,
            }
        })
        .collect();

    let eligible_candidates = ranked.len();

    ranked.sort_by(|a, b| {
        by_score_then_id(
            a.total_score,
            a.candidate.candidate_id(),
            b.total_score,
            b.candidate.candidate_id(),
        )
    });
    ranked.truncate(limit);

    RankResult {
        direction,
        ranked,
        total_candidates,
        eligible_candidates,
    }
}

/// Descending score, then ascending id
pub(crate) fn by_score_then_id(a_score: f64, a_id: &str, b_score: f64, b_id: &str) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_id.cmp(b_id))
}

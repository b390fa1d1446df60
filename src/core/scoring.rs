use crate::core::{
    distance::distance_between,
    matchers::{
        clamp_unit, grade_score, location_score, preference_score, price_score, review_score,
        subject_score, success_score,
    },
};
use crate::models::{
    MatchingParams, RequestWeights, ScoreBreakdown, SubScore, TeacherCandidate, TeacherWeights,
    TutoringRequest, WeightTable,
};

/// Score of one (reference, candidate) pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub breakdown: ScoreBreakdown,
    pub total: f64,
    pub distance_meters: Option<f64>,
}

/// Weighted sum of the sub-scores present in `breakdown`
///
/// Sub-scores are expected in `0.0..=1.0`; non-finite entries count as 0.
pub fn aggregate<W: WeightTable>(breakdown: &ScoreBreakdown, weights: &W) -> f64 {
    breakdown
        .iter()
        .map(|(kind, value)| weights.weight(kind) * clamp_unit(value))
        .sum()
}

/// Score a teacher against a parent's request
///
/// Scoring formula:
/// total = (
///     location * 0.20 +    # linear falloff inside the radius
///     subject * 0.25 +     # exact subject match
///     grade * 0.20 +       # grade taught by the teacher
///     review * 0.15 +      # average rating / 5
///     success * 0.10 +     # past successes, saturating
///     price * 0.10         # rate close to the requested price
/// )
pub fn score_teacher_for_request(
    teacher: &TeacherCandidate,
    request: &TutoringRequest,
    weights: &TeacherWeights,
    params: &MatchingParams,
) -> PairScore {
    let distance_meters = distance_between(request.location.as_ref(), teacher.location.as_ref());

    let mut breakdown = ScoreBreakdown::new();
    breakdown.insert(
        SubScore::Location,
        location_score(distance_meters, params.location_radius_m),
    );
    breakdown.insert(SubScore::Subject, subject_score(teacher, &request.subject));
    breakdown.insert(SubScore::Grade, grade_score(teacher, &request.grade));
    breakdown.insert(SubScore::Review, review_score(teacher.review_average));
    breakdown.insert(
        SubScore::Success,
        success_score(teacher.success_count, params.success_saturation),
    );
    breakdown.insert(SubScore::Price, price_score(teacher.hourly_rate, request.price));

    let total = aggregate(&breakdown, weights);

    PairScore {
        breakdown,
        total,
        distance_meters,
    }
}

/// Score an open request for a teacher
///
/// Scoring formula:
/// total = (
///     location * 0.25 +
///     subject * 0.25 +
///     grade * 0.20 +
///     price * 0.15 +
///     preference * 0.15   # all declared teacher preferences satisfied
/// )
pub fn score_request_for_teacher(
    request: &TutoringRequest,
    teacher: &TeacherCandidate,
    weights: &RequestWeights,
    params: &MatchingParams,
) -> PairScore {
    let distance_meters = distance_between(teacher.location.as_ref(), request.location.as_ref());

    let mut breakdown = ScoreBreakdown::new();
    breakdown.insert(
        SubScore::Location,
        location_score(distance_meters, params.location_radius_m),
    );
    breakdown.insert(SubScore::Subject, subject_score(teacher, &request.subject));
    breakdown.insert(SubScore::Grade, grade_score(teacher, &request.grade));
    breakdown.insert(SubScore::Price, price_score(teacher.hourly_rate, request.price));
    breakdown.insert(
        SubScore::Preference,
        preference_score(&request.teacher_preferences, &teacher.attributes),
    );

    let total = aggregate(&breakdown, weights);

    PairScore {
        breakdown,
        total,
        distance_meters,
    }
}

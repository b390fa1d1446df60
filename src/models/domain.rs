use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a stored status string does not name a known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// wire names match its serde names.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// A point on the map in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// (longitude, latitude) point, x being the longitude
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Lifecycle of a parent's tutoring request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    InProgress,
    Matched,
    Closed,
}

string_enum!(RequestStatus, "request status", {
    Open => "open",
    InProgress => "in_progress",
    Matched => "matched",
    Closed => "closed",
});

/// A teacher attribute the parent asks for, e.g. `gender = female`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub key: String,
    pub value: String,
}

impl TeacherPreference {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A parent's posted tutoring need
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutoringRequest {
    pub id: String,
    pub parent_id: String,
    pub subject: String,
    pub grade: String,
    pub price: f64,
    #[serde(default)]
    pub location: Option<Location>,
    pub status: RequestStatus,
    #[serde(default)]
    pub teacher_preferences: Vec<TeacherPreference>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TutoringRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }
}

/// One subject a teacher offers and the grade levels it is taught at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectOffering {
    pub name: String,
    #[serde(default)]
    pub grades: Vec<String>,
}

impl SubjectOffering {
    pub fn new<I, S>(name: impl Into<String>, grades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            grades: grades.into_iter().map(Into::into).collect(),
        }
    }
}

/// Account state of the user behind a teacher profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Inactive,
}

string_enum!(AccountStatus, "account status", {
    Active => "active",
    Suspended => "suspended",
    Inactive => "inactive",
});

/// Whether a teacher currently takes new students
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
    Offline,
}

string_enum!(Availability, "availability", {
    Available => "available",
    Busy => "busy",
    Offline => "offline",
});

/// Teacher profile as seen by the recommendation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCandidate {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub subjects: Vec<SubjectOffering>,
    pub hourly_rate: f64,
    /// Average of approved ratings, `None` when the teacher has none
    #[serde(default)]
    pub review_average: Option<f64>,
    #[serde(default)]
    pub success_count: u32,
    pub account_status: AccountStatus,
    pub availability: Availability,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl TeacherCandidate {
    pub fn teaches_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s.name == subject)
    }

    pub fn teaches_grade(&self, grade: &str) -> bool {
        self.subjects
            .iter()
            .any(|s| s.grades.iter().any(|g| g == grade))
    }

    /// Active account and open for new students
    pub fn is_available(&self) -> bool {
        self.account_status == AccountStatus::Active
            && self.availability == Availability::Available
    }
}

/// An approved parent-to-teacher rating
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEvent {
    pub id: String,
    pub rater_id: String,
    pub ratee_id: String,
    pub score: u8,
    pub created_at: DateTime<Utc>,
}

/// Names of the normalized components of a ranking score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubScore {
    Location,
    Subject,
    Grade,
    Review,
    Success,
    Price,
    Preference,
}

impl SubScore {
    pub const ALL: [SubScore; 7] = [
        SubScore::Location,
        SubScore::Subject,
        SubScore::Grade,
        SubScore::Review,
        SubScore::Success,
        SubScore::Price,
        SubScore::Preference,
    ];
}

/// Named sub-scores of one scored pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBreakdown(BTreeMap<SubScore, f64>);

impl ScoreBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SubScore, value: f64) {
        self.0.insert(kind, value);
    }

    pub fn get(&self, kind: SubScore) -> Option<f64> {
        self.0.get(&kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubScore, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A candidate together with its sub-score breakdown and aggregate score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate<T> {
    pub candidate: T,
    pub scores: ScoreBreakdown,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "distanceMeters", skip_serializing_if = "Option::is_none", default)]
    pub distance_meters: Option<f64>,
}

/// Allowed distance of a weight table's sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Rejected weight table
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum WeightError {
    #[error("{0:?} weight must be a non-negative number, got {1}")]
    InvalidWeight(SubScore, f64),

    #[error("weights must sum to 1.0, got {0}")]
    InvalidSum(f64),
}

/// Lookup of the weight applied to each sub-score
pub trait WeightTable {
    fn weight(&self, kind: SubScore) -> f64;

    fn sum(&self) -> f64;

    /// Every weight finite and non-negative, and the total within
    /// [`WEIGHT_SUM_TOLERANCE`] of 1.0, so aggregates stay in `0.0..=1.0`
    fn check(&self) -> Result<(), WeightError> {
        for kind in SubScore::ALL {
            let weight = self.weight(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightError::InvalidWeight(kind, weight));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::InvalidSum(sum));
        }
        Ok(())
    }
}

/// Weights for ranking teachers against a parent's request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherWeights {
    pub location: f64,
    pub subject: f64,
    pub grade: f64,
    pub review: f64,
    pub success: f64,
    pub price: f64,
}

impl Default for TeacherWeights {
    fn default() -> Self {
        Self {
            location: 0.20,
            subject: 0.25,
            grade: 0.20,
            review: 0.15,
            success: 0.10,
            price: 0.10,
        }
    }
}

impl WeightTable for TeacherWeights {
    fn weight(&self, kind: SubScore) -> f64 {
        match kind {
            SubScore::Location => self.location,
            SubScore::Subject => self.subject,
            SubScore::Grade => self.grade,
            SubScore::Review => self.review,
            SubScore::Success => self.success,
            SubScore::Price => self.price,
            SubScore::Preference => 0.0,
        }
    }

    fn sum(&self) -> f64 {
        self.location + self.subject + self.grade + self.review + self.success + self.price
    }
}

/// Weights for ranking open requests for a teacher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestWeights {
    pub location: f64,
    pub subject: f64,
    pub grade: f64,
    pub price: f64,
    pub preference: f64,
}

impl Default for RequestWeights {
    fn default() -> Self {
        Self {
            location: 0.25,
            subject: 0.25,
            grade: 0.20,
            price: 0.15,
            preference: 0.15,
        }
    }
}

impl WeightTable for RequestWeights {
    fn weight(&self, kind: SubScore) -> f64 {
        match kind {
            SubScore::Location => self.location,
            SubScore::Subject => self.subject,
            SubScore::Grade => self.grade,
            SubScore::Price => self.price,
            SubScore::Preference => self.preference,
            SubScore::Review | SubScore::Success => 0.0,
        }
    }

    fn sum(&self) -> f64 {
        self.location + self.subject + self.grade + self.price + self.preference
    }
}

/// Tunables shared by the matchers and the collaborative variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingParams {
    /// Distance at which the location score reaches zero
    pub location_radius_m: f64,
    /// Successful engagements needed for a full success score
    pub success_saturation: u32,
    /// Lowest rating counted as positive
    pub positive_rating: u8,
    pub max_similar_parents: usize,
}

impl Default for MatchingParams {
    fn default() -> Self {
        Self {
            location_radius_m: 5000.0,
            success_saturation: 10,
            positive_rating: 4,
            max_similar_parents: 10,
        }
    }
}

/// Which path produced a logged recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    TeacherForRequest,
    RequestForTeacher,
    Collaborative,
    TopRated,
}

string_enum!(RecommendationKind, "recommendation kind", {
    TeacherForRequest => "teacher_for_request",
    RequestForTeacher => "request_for_teacher",
    Collaborative => "collaborative",
    TopRated => "top_rated",
});

/// One entry of a logged recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub item_id: String,
    pub score: f64,
    pub rank: u32,
}

/// Reaction a user gives to a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Click,
    Ignore,
    Like,
    Dislike,
}

string_enum!(FeedbackAction, "feedback action", {
    Click => "click",
    Ignore => "ignore",
    Like => "like",
    Dislike => "dislike",
});

/// Persisted record of a served recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationLog {
    pub id: Uuid,
    pub user_id: String,
    pub kind: RecommendationKind,
    pub reference_id: Option<String>,
    pub items: Vec<RecommendedItem>,
    pub created_at: DateTime<Utc>,
    pub user_action: Option<FeedbackAction>,
    pub feedback_at: Option<DateTime<Utc>>,
}

impl RecommendationLog {
    pub fn new(
        user_id: impl Into<String>,
        kind: RecommendationKind,
        reference_id: Option<String>,
        items: Vec<RecommendedItem>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind,
            reference_id,
            items,
            created_at: Utc::now(),
            user_action: None,
            feedback_at: None,
        }
    }
}

//! Attribute matchers. Each returns a score in `0.0..=1.0`.

use std::collections::BTreeMap;

use crate::models::{TeacherCandidate, TeacherPreference, TutoringRequest};

/// Replace non-finite values by zero and clamp into `0.0..=1.0`
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Linear falloff from 1 at the reference point to 0 at `radius_m`
///
/// An unknown distance scores 0.
#[inline]
pub fn location_score(distance_m: Option<f64>, radius_m: f64) -> f64 {
    match distance_m {
        Some(d) if radius_m > 0.0 => clamp_unit(1.0 - d / radius_m),
        _ => 0.0,
    }
}

/// Exact subject name match
#[inline]
pub fn subject_score(teacher: &TeacherCandidate, subject: &str) -> f64 {
    if teacher.teaches_subject(subject) {
        1.0
    } else {
        0.0
    }
}

#[inline]
pub fn grade_score(teacher: &TeacherCandidate, grade: &str) -> f64 {
    if teacher.teaches_grade(grade) {
        1.0
    } else {
        0.0
    }
}

/// Closeness of the teacher's rate to the requested price
///
/// A requested price of zero (or less) scores 0.
#[inline]
pub fn price_score(hourly_rate: f64, requested_price: f64) -> f64 {
    if requested_price <= 0.0 || !requested_price.is_finite() {
        return 0.0;
    }
    clamp_unit(1.0 - (hourly_rate - requested_price).abs() / requested_price)
}

/// Average rating on a five-point scale, 0 without ratings
#[inline]
pub fn review_score(review_average: Option<f64>) -> f64 {
    review_average.map_or(0.0, |avg| clamp_unit(avg / 5.0))
}

#[inline]
pub fn success_score(success_count: u32, saturation: u32) -> f64 {
    if saturation == 0 {
        return 1.0;
    }
    (success_count as f64 / saturation as f64).min(1.0)
}

/// 1 when every declared preference matches the teacher's attribute
pub fn preference_score(
    preferences: &[TeacherPreference],
    attributes: &BTreeMap<String, String>,
) -> f64 {
    let all_match = preferences
        .iter()
        .all(|pref| attributes.get(&pref.key) == Some(&pref.value));

    if all_match {
        1.0
    } else {
        0.0
    }
}

/// Only active, available teachers are ranked
#[inline]
pub fn is_eligible_teacher(teacher: &TeacherCandidate) -> bool {
    teacher.is_available()
}

/// Only open requests are ranked
#[inline]
pub fn is_eligible_request(request: &TutoringRequest) -> bool {
    request.is_open()
}

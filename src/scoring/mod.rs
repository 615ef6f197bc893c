//! The scoring aggregator: turns the latest metric values into category
//! scores, an overall score, an eligibility tier, and recommendations.
//!
//! Weights and thresholds are fixed; there is no configuration surface.
//! Everything here is a pure function of a `MetricValues` copy, computed
//! exactly once when a run stops.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricValues;

const VOICE_CONFIDENCE_WEIGHT: f64 = 0.3;
const VOICE_AUDIBILITY_WEIGHT: f64 = 0.4;
const VOICE_CLARITY_WEIGHT: f64 = 0.3;

const FACIAL_ENGAGEMENT_WEIGHT: f64 = 0.6;
const FACIAL_VARIETY_WEIGHT: f64 = 0.4;

const TEACHING_INTERACTION_WEIGHT: f64 = 0.4;
const TEACHING_EXAMPLES_WEIGHT: f64 = 0.3;
const TEACHING_STUDENT_WEIGHT: f64 = 0.3;

const OVERALL_VOICE_WEIGHT: f64 = 0.4;
const OVERALL_FACIAL_WEIGHT: f64 = 0.3;
const OVERALL_TEACHING_WEIGHT: f64 = 0.3;

const ELIGIBLE_CUTOFF: f64 = 85.0;
const NEEDS_IMPROVEMENT_CUTOFF: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Eligibility {
    Eligible,
    NeedsImprovement,
    NotEligible,
}

impl Eligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "eligible",
            Eligibility::NeedsImprovement => "needs-improvement",
            Eligibility::NotEligible => "not-eligible",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "eligible" => Some(Eligibility::Eligible),
            "needs-improvement" => Some(Eligibility::NeedsImprovement),
            "not-eligible" => Some(Eligibility::NotEligible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub title: String,
    pub description: String,
}

impl Recommendation {
    fn new(category: &str, priority: Priority, title: &str, description: &str) -> Self {
        Self {
            category: category.to_string(),
            priority,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// The three category scores plus the weighted overall, unclamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub voice_score: f64,
    pub facial_score: f64,
    pub teaching_score: f64,
    pub overall_score: f64,
}

/// Compute the weighted category and overall scores.
///
/// `expression_variety` and `student_engagement` feed the formula but no
/// producer ever writes them, so their terms contribute 0 for every live
/// run. They stay in the formula rather than being folded away, so the
/// published weights remain visible.
pub fn score(values: &MetricValues) -> ScoreBreakdown {
    let voice_score = values.voice.confidence * VOICE_CONFIDENCE_WEIGHT
        + values.voice.audibility * VOICE_AUDIBILITY_WEIGHT
        + values.voice.clarity * VOICE_CLARITY_WEIGHT;

    let facial_score = values.facial.engagement_level * FACIAL_ENGAGEMENT_WEIGHT
        + values.facial.expression_variety * FACIAL_VARIETY_WEIGHT;

    let teaching_score = values.teaching.interaction_level * TEACHING_INTERACTION_WEIGHT
        + values.teaching.example_usage * TEACHING_EXAMPLES_WEIGHT
        + values.teaching.student_engagement * TEACHING_STUDENT_WEIGHT;

    let overall_score = voice_score * OVERALL_VOICE_WEIGHT
        + facial_score * OVERALL_FACIAL_WEIGHT
        + teaching_score * OVERALL_TEACHING_WEIGHT;

    ScoreBreakdown {
        voice_score,
        facial_score,
        teaching_score,
        overall_score,
    }
}

/// First matching tier wins: `>= 85` eligible, `>= 70` needs improvement,
/// anything below is not eligible.
pub fn classify(overall_score: f64) -> Eligibility {
    if overall_score >= ELIGIBLE_CUTOFF {
        Eligibility::Eligible
    } else if overall_score >= NEEDS_IMPROVEMENT_CUTOFF {
        Eligibility::NeedsImprovement
    } else {
        Eligibility::NotEligible
    }
}

/// Clamp a percentage-like value into `[0,100]` for display/persistence.
/// Intermediate score arithmetic stays unclamped; this is the single place
/// the final bound is applied.
pub fn display_clamp(value: f64) -> f64 {
    value.max(0.0).min(100.0)
}

/// Derive the recommendation list: an ordered set of independent threshold
/// checks, all matching rules fire. Falls back to a single positive message
/// when nothing fires.
pub fn recommendations(values: &MetricValues, overall_score: f64) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if values.voice.confidence < 70.0 {
        out.push(Recommendation::new(
            "voice",
            Priority::High,
            "Improve Voice Confidence",
            "Practice speaking exercises and breathing techniques to build confidence.",
        ));
    }

    if values.voice.audibility < 75.0 {
        out.push(Recommendation::new(
            "voice",
            Priority::High,
            "Enhance Voice Projection",
            "Work on projecting your voice to ensure all students can hear clearly.",
        ));
    }

    if values.facial.engagement_level < 70.0 {
        out.push(Recommendation::new(
            "engagement",
            Priority::Medium,
            "Increase Facial Expressiveness",
            "Use more facial expressions and gestures to engage students.",
        ));
    }

    if values.teaching.interaction_level < 80.0 {
        out.push(Recommendation::new(
            "teaching",
            Priority::Medium,
            "Increase Student Interaction",
            "Ask more questions and encourage student participation.",
        ));
    }

    if values.teaching.example_usage < 75.0 {
        out.push(Recommendation::new(
            "teaching",
            Priority::Low,
            "Use More Examples",
            "Include more real-world examples to illustrate concepts.",
        ));
    }

    if overall_score < NEEDS_IMPROVEMENT_CUTOFF {
        out.push(Recommendation::new(
            "general",
            Priority::Medium,
            "Continue Practice",
            "Keep practicing teaching techniques to raise your overall performance.",
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            "general",
            Priority::Low,
            "Keep It Up",
            "Strong performance across all assessed areas. Keep up the good work.",
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{FacialMetrics, TeachingMetrics, VoiceMetrics};

    fn values(
        confidence: f64,
        audibility: f64,
        clarity: f64,
        engagement: f64,
        interaction: f64,
        examples: f64,
    ) -> MetricValues {
        MetricValues {
            voice: VoiceMetrics {
                confidence,
                volume: 0.0,
                clarity,
                audibility,
            },
            facial: FacialMetrics {
                engagement_level: engagement,
                ..Default::default()
            },
            teaching: TeachingMetrics {
                interaction_level: interaction,
                example_usage: examples,
                student_engagement: 0.0,
            },
        }
    }

    #[test]
    fn voice_score_matches_worked_example() {
        // confidence 80, audibility 90, clarity 70 -> 24 + 36 + 21 = 81
        let breakdown = score(&values(80.0, 90.0, 70.0, 0.0, 0.0, 0.0));
        assert!((breakdown.voice_score - 81.0).abs() < 1e-9);
    }

    #[test]
    fn overall_is_weighted_sum_of_categories() {
        let v = values(80.0, 90.0, 70.0, 90.0, 80.0, 80.0);
        let b = score(&v);
        let expected = b.voice_score * 0.4 + b.facial_score * 0.3 + b.teaching_score * 0.3;
        assert!((b.overall_score - expected).abs() < 1e-9);
        // Unpopulated variety/student terms drag the categories down.
        assert!((b.facial_score - 54.0).abs() < 1e-9);
        assert!((b.teaching_score - 56.0).abs() < 1e-9);
    }

    #[test]
    fn classification_boundaries_are_half_open() {
        assert_eq!(classify(85.0), Eligibility::Eligible);
        assert_eq!(classify(84.999), Eligibility::NeedsImprovement);
        assert_eq!(classify(70.0), Eligibility::NeedsImprovement);
        assert_eq!(classify(69.999), Eligibility::NotEligible);
        assert_eq!(classify(0.0), Eligibility::NotEligible);
    }

    #[test]
    fn display_clamp_bounds_both_sides() {
        assert_eq!(display_clamp(108.0), 100.0);
        assert_eq!(display_clamp(-3.0), 0.0);
        assert_eq!(display_clamp(55.5), 55.5);
    }

    #[test]
    fn zeroed_board_is_not_eligible_without_error() {
        let v = MetricValues::default();
        let b = score(&v);
        assert_eq!(b.overall_score, 0.0);
        assert_eq!(classify(b.overall_score), Eligibility::NotEligible);
        let recs = recommendations(&v, b.overall_score);
        assert!(!recs.is_empty());
    }

    #[test]
    fn all_thresholds_met_gives_single_positive_message() {
        let v = values(90.0, 90.0, 90.0, 90.0, 90.0, 90.0);
        let b = score(&v);
        let recs = recommendations(&v, 90.0_f64.max(b.overall_score));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "general");
        assert_eq!(recs[0].priority, Priority::Low);
    }

    #[test]
    fn lowering_one_metric_adds_exactly_its_message() {
        let good = values(90.0, 90.0, 90.0, 90.0, 90.0, 90.0);
        // Hold overall above 70 so the generic rule stays quiet either way.
        let base = recommendations(&good, 80.0);

        let mut low_conf = good;
        low_conf.voice.confidence = 60.0;
        let with_conf = recommendations(&low_conf, 80.0);

        assert_eq!(with_conf.len(), 1);
        assert_eq!(with_conf[0].title, "Improve Voice Confidence");
        // The only rule in `base` was the positive placeholder, which exists
        // exactly because nothing fired; no real message was removed.
        assert_eq!(base.len(), 1);
        assert_eq!(base[0].category, "general");
    }

    #[test]
    fn failing_rules_accumulate_in_order() {
        let v = values(60.0, 60.0, 60.0, 60.0, 60.0, 60.0);
        let b = score(&v);
        let recs = recommendations(&v, b.overall_score);
        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Improve Voice Confidence",
                "Enhance Voice Projection",
                "Increase Facial Expressiveness",
                "Increase Student Interaction",
                "Use More Examples",
                "Continue Practice",
            ]
        );
    }

    #[test]
    fn adding_a_failure_never_removes_existing_messages() {
        let mut v = values(60.0, 90.0, 90.0, 90.0, 90.0, 90.0);
        let before: Vec<String> = recommendations(&v, 80.0)
            .into_iter()
            .map(|r| r.title)
            .collect();

        v.teaching.example_usage = 50.0;
        let after: Vec<String> = recommendations(&v, 80.0)
            .into_iter()
            .map(|r| r.title)
            .collect();

        for title in &before {
            assert!(after.contains(title), "lost message {title}");
        }
        assert_eq!(after.len(), before.len() + 1);
    }

    #[test]
    fn eligibility_round_trips_through_strings() {
        for tier in [
            Eligibility::Eligible,
            Eligibility::NeedsImprovement,
            Eligibility::NotEligible,
        ] {
            assert_eq!(Eligibility::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(Eligibility::from_str("pending"), None);
    }
}

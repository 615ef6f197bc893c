use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Voice readings derived from the frequency spectrum (or simulated).
/// Values are percentage-like but intentionally NOT clamped here; clamping
/// happens once, at display/persist time (see `scoring::display_clamp`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMetrics {
    pub confidence: f64,
    pub volume: f64,
    pub clarity: f64,
    pub audibility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Emotion {
    Neutral,
    Happy,
    Serious,
    Confident,
    Engaged,
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Neutral
    }
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Serious,
        Emotion::Confident,
        Emotion::Engaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Serious => "serious",
            Emotion::Confident => "confident",
            Emotion::Engaged => "engaged",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacialMetrics {
    pub teacher_emotion: Emotion,
    pub engagement_level: f64,
    /// Declared input of the facial score but no producer writes it; it
    /// stays 0.0 for the whole run.
    pub expression_variety: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingMetrics {
    pub interaction_level: f64,
    pub example_usage: f64,
    /// Same situation as `expression_variety`: never assigned, always 0.0.
    pub student_engagement: f64,
}

/// Latest value of every metric group. Producers write disjoint groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValues {
    pub voice: VoiceMetrics,
    pub facial: FacialMetrics,
    pub teaching: TeachingMetrics,
}

/// Timestamped copy of the board, appended once per second while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub voice: VoiceMetrics,
    pub facial: FacialMetrics,
    pub teaching: TeachingMetrics,
}

impl Snapshot {
    pub fn of(session_id: &str, timestamp: DateTime<Utc>, values: &MetricValues) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp,
            voice: values.voice,
            facial: values.facial,
            teaching: values.teaching,
        }
    }
}

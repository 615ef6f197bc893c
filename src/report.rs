//! The read-only projection of a stopped run, plus its two export formats.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AssessmentRequest;
use crate::metrics::MetricValues;
use crate::scoring::{self, Eligibility, Recommendation, ScoreBreakdown};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub assessment_id: String,
    pub teacher_name: String,
    pub teacher_email: Option<String>,
    pub institution: String,
    pub subject: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    /// Wall-clock run length, start to completion; 0 when the start time is
    /// unknown.
    pub duration_seconds: i64,
    pub snapshot_count: u64,
    /// Final metric values the scores were computed from (raw, unclamped).
    pub metrics: MetricValues,
    /// Raw weighted scores; clamping happens in rendering and persistence.
    pub scores: ScoreBreakdown,
    pub eligibility: Eligibility,
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    /// Compute the report from the final board state. Works on a zeroed
    /// board too (a run stopped before any snapshot): the scores degenerate
    /// deterministically to the not-eligible tier.
    pub fn from_run(
        assessment_id: &str,
        request: &AssessmentRequest,
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
        snapshot_count: u64,
        values: &MetricValues,
    ) -> Self {
        let scores = scoring::score(values);
        let eligibility = scoring::classify(scores.overall_score);
        let recommendations = scoring::recommendations(values, scores.overall_score);
        let duration_seconds = started_at
            .map(|started| (completed_at - started).num_seconds().max(0))
            .unwrap_or(0);

        Self {
            assessment_id: assessment_id.to_string(),
            teacher_name: request.teacher_name.clone(),
            teacher_email: request.teacher_email.clone(),
            institution: request.institution.clone(),
            subject: request.subject.clone(),
            started_at,
            completed_at,
            duration_seconds,
            snapshot_count,
            metrics: *values,
            scores,
            eligibility,
            recommendations,
        }
    }

    /// Scores with the display clamp applied, for rendering and persistence.
    pub fn clamped_scores(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            voice_score: scoring::display_clamp(self.scores.voice_score),
            facial_score: scoring::display_clamp(self.scores.facial_score),
            teaching_score: scoring::display_clamp(self.scores.teaching_score),
            overall_score: scoring::display_clamp(self.scores.overall_score),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Multi-section plain-text rendering: teacher info, summary, category
    /// breakdown, recommendation bullets.
    pub fn render_text(&self) -> String {
        let scores = self.clamped_scores();
        let mut out = String::new();

        let _ = writeln!(out, "TEACHER ASSESSMENT REPORT");
        let _ = writeln!(out, "=========================");
        let _ = writeln!(out);
        let _ = writeln!(out, "Teacher:      {}", self.teacher_name);
        if let Some(email) = &self.teacher_email {
            let _ = writeln!(out, "Email:        {email}");
        }
        let _ = writeln!(out, "Institution:  {}", self.institution);
        if !self.subject.is_empty() {
            let _ = writeln!(out, "Subject:      {}", self.subject);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Summary");
        let _ = writeln!(out, "-------");
        if let Some(started) = self.started_at {
            let _ = writeln!(out, "Started:      {}", started.to_rfc3339());
        }
        let _ = writeln!(out, "Completed:    {}", self.completed_at.to_rfc3339());
        let _ = writeln!(out, "Duration:     {}s", self.duration_seconds);
        let _ = writeln!(out, "Snapshots:    {}", self.snapshot_count);
        let _ = writeln!(out, "Overall:      {:.1}", scores.overall_score);
        let _ = writeln!(out, "Eligibility:  {}", self.eligibility.as_str());
        let _ = writeln!(out);

        let _ = writeln!(out, "Category Breakdown");
        let _ = writeln!(out, "------------------");
        let _ = writeln!(out, "{}", score_bar("Voice", scores.voice_score));
        let _ = writeln!(out, "{}", score_bar("Facial", scores.facial_score));
        let _ = writeln!(out, "{}", score_bar("Teaching", scores.teaching_score));
        let _ = writeln!(out);

        let _ = writeln!(out, "Recommendations");
        let _ = writeln!(out, "---------------");
        for rec in &self.recommendations {
            let _ = writeln!(
                out,
                "* [{}/{}] {}: {}",
                rec.category,
                rec.priority.as_str(),
                rec.title,
                rec.description
            );
        }

        out
    }
}

fn score_bar(label: &str, score: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((score / 100.0) * WIDTH as f64).round() as usize;
    let filled = filled.min(WIDTH);
    format!(
        "{label:<10} [{}{}] {score:>5.1}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AssessmentRequest {
        AssessmentRequest {
            teacher_name: "Amina Diallo".into(),
            teacher_email: None,
            institution: "Riverside High".into(),
            subject: "Physics".into(),
            experience_years: None,
            duration_minutes: 15,
        }
    }

    #[test]
    fn zeroed_run_produces_a_well_formed_report() {
        let report = Report::from_run(
            "a-1",
            &request(),
            None,
            Utc::now(),
            0,
            &MetricValues::default(),
        );
        assert_eq!(report.eligibility, Eligibility::NotEligible);
        assert_eq!(report.scores.overall_score, 0.0);
        assert!(!report.recommendations.is_empty());

        let text = report.render_text();
        assert!(text.contains("TEACHER ASSESSMENT REPORT"));
        assert!(text.contains("not-eligible"));
        assert!(text.contains("Recommendations"));
    }

    #[test]
    fn clamped_scores_bound_raw_values() {
        let mut values = MetricValues::default();
        values.voice.confidence = 120.0;
        values.voice.audibility = 110.0;
        values.voice.clarity = 105.0;

        let report = Report::from_run("a-2", &request(), None, Utc::now(), 5, &values);
        // Raw voice score exceeds 100, the clamped view does not.
        assert!(report.scores.voice_score > 100.0);
        assert_eq!(report.clamped_scores().voice_score, 100.0);
    }

    #[test]
    fn json_export_uses_camel_case() {
        let report = Report::from_run(
            "a-3",
            &request(),
            Some(Utc::now()),
            Utc::now(),
            12,
            &MetricValues::default(),
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"assessmentId\""));
        assert!(json.contains("\"overallScore\""));
        assert!(json.contains("\"durationSeconds\""));
        assert!(json.contains("\"not-eligible\""));
    }

    #[test]
    fn duration_is_derived_from_the_timestamps() {
        let started = Utc::now();
        let completed = started + chrono::Duration::seconds(90);
        let report = Report::from_run(
            "a-4",
            &request(),
            Some(started),
            completed,
            90,
            &MetricValues::default(),
        );
        assert_eq!(report.duration_seconds, 90);

        let unstarted =
            Report::from_run("a-5", &request(), None, completed, 0, &MetricValues::default());
        assert_eq!(unstarted.duration_seconds, 0);
    }
}

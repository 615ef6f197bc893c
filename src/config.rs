use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Assessment durations offered to the operator, in minutes.
pub const DURATION_PRESETS: [u32; 4] = [15, 30, 45, 60];

/// Operator-supplied identity and run parameters, validated before a run
/// may start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_email: Option<String>,
    pub institution: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
}

fn default_duration() -> u32 {
    15
}

impl AssessmentRequest {
    /// Required fields must be non-empty and the duration must be one of the
    /// fixed presets. Violations block the run from starting.
    pub fn validate(&self) -> Result<()> {
        if self.teacher_name.trim().is_empty() {
            bail!("teacher name is required");
        }
        if self.institution.trim().is_empty() {
            bail!("institution is required");
        }
        if !DURATION_PRESETS.contains(&self.duration_minutes) {
            bail!(
                "duration must be one of {:?} minutes, got {}",
                DURATION_PRESETS,
                self.duration_minutes
            );
        }
        Ok(())
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_minutes as u64 * 60 * 1000
    }
}

/// Optional remote sync endpoint for per-second snapshot payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    pub endpoint: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Run configuration loaded from a JSON file: the assessment request plus
/// optional remote sync and database location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub request: AssessmentRequest,
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
    #[serde(default)]
    pub database_path: Option<String>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.request.validate()?;
        Ok(config)
    }
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
            experience_years: Some(6),
            duration_minutes: 15,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut req = request();
        req.teacher_name = "   ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_institution_is_rejected() {
        let mut req = request();
        req.institution = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn only_preset_durations_are_accepted() {
        for minutes in DURATION_PRESETS {
            let mut req = request();
            req.duration_minutes = minutes;
            assert!(req.validate().is_ok());
        }
        let mut req = request();
        req.duration_minutes = 20;
        assert!(req.validate().is_err());
    }

    #[test]
    fn duration_defaults_to_fifteen_minutes() {
        let parsed: AssessmentRequest = serde_json::from_str(
            r#"{"teacherName": "A", "institution": "B"}"#,
        )
        .unwrap();
        assert_eq!(parsed.duration_minutes, 15);
        assert_eq!(parsed.duration_ms(), 15 * 60 * 1000);
    }
}

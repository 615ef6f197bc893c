use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl Default for RunPhase {
    fn default() -> Self {
        RunPhase::Idle
    }
}

/// In-memory lifecycle state of the single live run.
///
/// `running_anchor` is the monotonic start reference; combined with
/// `active_ms` (frozen on stop) it yields the true elapsed time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: RunPhase,
    pub session_id: Option<String>,
    pub target_ms: u64,
    pub active_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            session_id: None,
            target_ms: 0,
            active_ms: 0,
            started_at: None,
            stopped_at: None,
            running_anchor: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_active_ms(&self) -> u64 {
        if let (RunPhase::Running, Some(anchor)) = (self.phase, self.running_anchor) {
            anchor.elapsed().as_millis() as u64
        } else {
            self.active_ms
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        self.target_ms.saturating_sub(self.current_active_ms())
    }

    pub fn begin(
        &mut self,
        session_id: String,
        target_ms: u64,
        started_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            phase: RunPhase::Running,
            session_id: Some(session_id),
            target_ms,
            active_ms: 0,
            started_at: Some(started_at),
            stopped_at: None,
            running_anchor: Some(now),
        };
    }

    pub fn stop(&mut self, stopped_at: DateTime<Utc>) {
        self.active_ms = self.current_active_ms();
        self.phase = RunPhase::Completed;
        self.stopped_at = Some(stopped_at);
        self.running_anchor = None;
    }

    pub fn cancel(&mut self, cancelled_at: DateTime<Utc>) {
        self.active_ms = self.current_active_ms();
        self.phase = RunPhase::Cancelled;
        self.stopped_at = Some(cancelled_at);
        self.running_anchor = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

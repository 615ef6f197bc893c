mod types;

pub use types::{Emotion, FacialMetrics, MetricValues, Snapshot, TeachingMetrics, VoiceMetrics};

use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared latest-value state for the three metric groups.
///
/// Each producer overwrites only its own group, so interleaving between the
/// producer tasks is harmless; the snapshot sampler reads a consistent copy
/// under the same lock.
#[derive(Clone)]
pub struct MetricBoard {
    inner: Arc<Mutex<MetricValues>>,
}

impl MetricBoard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricValues::default())),
        }
    }

    pub async fn set_voice(&self, voice: VoiceMetrics) {
        self.inner.lock().await.voice = voice;
    }

    pub async fn set_facial(&self, facial: FacialMetrics) {
        self.inner.lock().await.facial = facial;
    }

    pub async fn set_teaching(&self, teaching: TeachingMetrics) {
        self.inner.lock().await.teaching = teaching;
    }

    /// Copy of the current values, for snapshotting and scoring.
    pub async fn current(&self) -> MetricValues {
        *self.inner.lock().await
    }

    /// Zero every group; called when a new run begins.
    pub async fn reset(&self) {
        *self.inner.lock().await = MetricValues::default();
    }
}

impl Default for MetricBoard {
    fn default() -> Self {
        Self::new()
    }
}

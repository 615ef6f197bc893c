use rand::seq::SliceRandom;
use rand::Rng;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::{Emotion, FacialMetrics, MetricBoard};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

const FACIAL_INTERVAL_MS: u64 = 2500;

/// Facial/engagement producer: every 2.5 seconds pick an emotion uniformly
/// and draw the engagement level from that emotion's band. No visual input
/// is consumed; this is the simulator the real analyzer degrades to.
///
/// `expression_variety` is left at its zero default on every tick.
pub async fn facial_loop(board: MetricBoard, cancel_token: CancellationToken) {
    let mut ticker = interval(Duration::from_millis(FACIAL_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let metrics = simulated_facial();
                log_info!(
                    "facial tick: emotion={} engagement={:.1}",
                    metrics.teacher_emotion.as_str(), metrics.engagement_level
                );
                board.set_facial(metrics).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("facial producer shutting down");
                return;
            }
        }
    }
}

fn simulated_facial() -> FacialMetrics {
    let mut rng = rand::thread_rng();
    let emotion = *Emotion::ALL
        .choose(&mut rng)
        .unwrap_or(&Emotion::Neutral);
    let (low, high) = engagement_band(emotion);
    FacialMetrics {
        teacher_emotion: emotion,
        engagement_level: rng.gen_range(low..=high),
        ..Default::default()
    }
}

fn engagement_band(emotion: Emotion) -> (f64, f64) {
    match emotion {
        Emotion::Happy => (85.0, 100.0),
        Emotion::Confident => (80.0, 100.0),
        Emotion::Engaged => (75.0, 100.0),
        Emotion::Serious => (65.0, 95.0),
        Emotion::Neutral => (70.0, 95.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_stays_in_the_emotion_band() {
        for _ in 0..200 {
            let m = simulated_facial();
            let (low, high) = engagement_band(m.teacher_emotion);
            assert!(
                m.engagement_level >= low && m.engagement_level <= high,
                "{} out of band for {}",
                m.engagement_level,
                m.teacher_emotion.as_str()
            );
        }
    }

    #[test]
    fn expression_variety_is_never_produced() {
        for _ in 0..50 {
            assert_eq!(simulated_facial().expression_variety, 0.0);
        }
    }
}

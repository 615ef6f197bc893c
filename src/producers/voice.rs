use rand::Rng;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::analysis::analyze_spectrum;
use crate::capture::SpectrumSource;
use crate::metrics::{MetricBoard, VoiceMetrics};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::{log_info, log_warn};

/// Live sampling runs at paint-loop cadence; the simulated fallback ticks
/// once per second instead.
const FRAME_INTERVAL_MS: u64 = 16;
const FALLBACK_INTERVAL_SECS: u64 = 1;

/// Voice producer: one fresh `VoiceMetrics` per tick.
///
/// With a spectrum source, every frame analyzes the current frequency bins.
/// Without one (or once the stream runs dry), the loop degrades to uniform
/// random draws within fixed bands on a 1-second period. Neither path can
/// fail; degradation is logged for the operator, never raised.
pub async fn voice_loop(
    board: MetricBoard,
    source: Option<Box<dyn SpectrumSource>>,
    cancel_token: CancellationToken,
) {
    if let Some(mut source) = source {
        let mut ticker = interval(Duration::from_millis(FRAME_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match source.sample() {
                        Some(bins) => {
                            let metrics = analyze_spectrum(&bins);
                            log_info!(
                                "voice frame: volume={:.1} confidence={:.1}",
                                metrics.volume, metrics.confidence
                            );
                            board.set_voice(metrics).await;
                        }
                        None => {
                            log::warn!("spectrum source unavailable, voice producer degrading to simulation");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    log_info!("voice producer shutting down");
                    return;
                }
            }
        }
    } else {
        log::warn!("no spectrum source configured, voice producer running simulated");
    }

    let mut ticker = interval(Duration::from_secs(FALLBACK_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let metrics = simulated_voice();
                log_warn!("voice tick (simulated): volume={:.1}", metrics.volume);
                board.set_voice(metrics).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("voice producer shutting down");
                return;
            }
        }
    }
}

fn simulated_voice() -> VoiceMetrics {
    let mut rng = rand::thread_rng();
    VoiceMetrics {
        confidence: rng.gen_range(70.0..=90.0),
        volume: rng.gen_range(60.0..=90.0),
        clarity: rng.gen_range(65.0..=90.0),
        audibility: rng.gen_range(75.0..=95.0),
    }
}

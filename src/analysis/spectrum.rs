//! Voice feature extraction over a frequency-domain sample.
//!
//! The capture collaborator supplies one magnitude per bin for an FFT window
//! of 2048 samples, i.e. 1024 unsigned byte bins. All four features are
//! cheap reductions over that array; none of them clamp except `audibility`,
//! whose `min(100, ..)` is part of the formula itself.

use crate::metrics::VoiceMetrics;

/// Bin count for an FFT window of 2048 samples.
pub const SPECTRUM_BINS: usize = 1024;

/// Compute the four voice metrics from one spectrum sample.
pub fn analyze_spectrum(bins: &[u8; SPECTRUM_BINS]) -> VoiceMetrics {
    let volume = volume(bins);
    VoiceMetrics {
        confidence: confidence(bins),
        volume,
        clarity: clarity(bins),
        audibility: audibility(volume),
    }
}

/// Mean magnitude scaled to a percentage of full scale (255).
fn volume(bins: &[u8; SPECTRUM_BINS]) -> f64 {
    mean(bins) / 255.0 * 100.0
}

/// `max(0, 100 - 2σ)`: a steady level (low variance across bins) reads as
/// more confident than a jittery one.
fn confidence(bins: &[u8; SPECTRUM_BINS]) -> f64 {
    let mean = mean(bins);
    let variance = bins
        .iter()
        .map(|&b| {
            let d = b as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / SPECTRUM_BINS as f64;
    (100.0 - 2.0 * variance.sqrt()).max(0.0)
}

/// Ratio of the weakest to the strongest band mean, as a percentage.
/// Bands: first quarter (low), middle half (mid), last quarter (high).
/// Balanced spectral energy scores higher; a silent spectrum scores 0.
fn clarity(bins: &[u8; SPECTRUM_BINS]) -> f64 {
    let quarter = SPECTRUM_BINS / 4;
    let low = mean(&bins[..quarter]);
    let mid = mean(&bins[quarter..SPECTRUM_BINS - quarter]);
    let high = mean(&bins[SPECTRUM_BINS - quarter..]);

    let max = low.max(mid).max(high);
    if max == 0.0 {
        return 0.0;
    }
    let min = low.min(mid).min(high);
    min / max * 100.0
}

/// `min(100, volume * 1.2)` — the raw value can exceed 100 before the clamp.
fn audibility(volume: f64) -> f64 {
    (volume * 1.2).min(100.0)
}

fn mean(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&b| b as f64).sum::<f64>() / bins.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(level: u8) -> [u8; SPECTRUM_BINS] {
        [level; SPECTRUM_BINS]
    }

    #[test]
    fn volume_is_mean_over_full_scale() {
        let metrics = analyze_spectrum(&flat(255));
        assert!((metrics.volume - 100.0).abs() < 1e-9);

        let metrics = analyze_spectrum(&flat(51));
        assert!((metrics.volume - 20.0).abs() < 1e-9);
    }

    #[test]
    fn steady_spectrum_gives_full_confidence() {
        // Zero variance across bins means no penalty at all.
        let metrics = analyze_spectrum(&flat(128));
        assert!((metrics.confidence - 100.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_floors_at_zero() {
        // Alternating 0/255 bins: σ = 127.5, raw score 100 - 255 = -155.
        let mut bins = [0u8; SPECTRUM_BINS];
        for (i, bin) in bins.iter_mut().enumerate() {
            if i % 2 == 0 {
                *bin = 255;
            }
        }
        let metrics = analyze_spectrum(&bins);
        assert_eq!(metrics.confidence, 0.0);
    }

    #[test]
    fn balanced_bands_give_full_clarity() {
        let metrics = analyze_spectrum(&flat(100));
        assert!((metrics.clarity - 100.0).abs() < 1e-9);
    }

    #[test]
    fn lopsided_bands_lower_clarity() {
        // Low band at 200, everything else at 50: min/max = 25%.
        let mut bins = [50u8; SPECTRUM_BINS];
        for bin in bins.iter_mut().take(SPECTRUM_BINS / 4) {
            *bin = 200;
        }
        let metrics = analyze_spectrum(&bins);
        assert!((metrics.clarity - 25.0).abs() < 1e-9);
    }

    #[test]
    fn silent_spectrum_is_all_zero() {
        let metrics = analyze_spectrum(&flat(0));
        assert_eq!(metrics.volume, 0.0);
        assert_eq!(metrics.clarity, 0.0);
        assert_eq!(metrics.audibility, 0.0);
        // Silence is perfectly steady, so confidence is still 100.
        assert!((metrics.confidence - 100.0).abs() < 1e-9);
    }

    #[test]
    fn audibility_clamps_at_one_hundred() {
        // volume 90 -> raw audibility 108 -> clamped 100.
        let mut bins = [0u8; SPECTRUM_BINS];
        let level = (0.9_f64 * 255.0).round() as u8; // 230 -> volume ~90.2
        bins.iter_mut().for_each(|b| *b = level);
        let metrics = analyze_spectrum(&bins);
        assert!(metrics.volume > 89.0 && metrics.volume < 91.0);
        assert_eq!(metrics.audibility, 100.0);
    }

    #[test]
    fn audibility_scales_below_the_clamp() {
        let bins = flat(102); // volume 40
        let metrics = analyze_spectrum(&bins);
        assert!((metrics.audibility - metrics.volume * 1.2).abs() < 1e-9);
        assert!(metrics.audibility < 100.0);
    }
}

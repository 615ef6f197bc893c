use rand::Rng;

use crate::metrics::{MetricBoard, TeachingMetrics};

/// Teaching-quality producer: draws once at assessment start and holds the
/// values constant for the run.
///
/// `student_engagement` is never assigned and stays 0.0; it still feeds the
/// teaching score formula.
pub async fn seed_teaching(board: &MetricBoard) {
    let metrics = simulated_teaching();
    board.set_teaching(metrics).await;
}

fn simulated_teaching() -> TeachingMetrics {
    let mut rng = rand::thread_rng();
    TeachingMetrics {
        interaction_level: rng.gen_range(60.0..=100.0),
        example_usage: rng.gen_range(70.0..=100.0),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_their_bands() {
        for _ in 0..200 {
            let m = simulated_teaching();
            assert!((60.0..=100.0).contains(&m.interaction_level));
            assert!((70.0..=100.0).contains(&m.example_usage));
            assert_eq!(m.student_engagement, 0.0);
        }
    }
}

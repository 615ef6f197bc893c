pub mod spectrum;

pub use spectrum::{analyze_spectrum, SPECTRUM_BINS};

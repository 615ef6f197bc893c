//! Contract for the external audio-capture collaborator.

use crate::analysis::SPECTRUM_BINS;

/// Supplies the current frequency spectrum of a live audio stream on demand.
///
/// `None` means no sample is available right now (stream not ready, device
/// lost). The voice producer treats a missing source or a dry stream as a
/// signal to run in simulated fallback mode; it never treats it as an error.
pub trait SpectrumSource: Send + 'static {
    fn sample(&mut self) -> Option<[u8; SPECTRUM_BINS]>;
}

impl<F> SpectrumSource for F
where
    F: FnMut() -> Option<[u8; SPECTRUM_BINS]> + Send + 'static,
{
    fn sample(&mut self) -> Option<[u8; SPECTRUM_BINS]> {
        self()
    }
}

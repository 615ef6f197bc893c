mod facial;
mod teaching;
mod voice;

pub use facial::facial_loop;
pub use teaching::seed_teaching;
pub use voice::voice_loop;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::SpectrumSource;
use crate::metrics::MetricBoard;

/// Owns the producer tasks for one run. Cancellation is structural: the set
/// holds the token and the join handles, so stopping cancels every loop and
/// waits for it to exit rather than trusting a shared flag.
pub struct ProducerSet {
    handles: Vec<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ProducerSet {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel_token: None,
        }
    }

    pub async fn start(
        &mut self,
        board: MetricBoard,
        source: Option<Box<dyn SpectrumSource>>,
    ) -> Result<()> {
        if self.cancel_token.is_some() {
            bail!("producers already active");
        }

        // Teaching values are drawn once and held for the whole run.
        seed_teaching(&board).await;

        let cancel_token = CancellationToken::new();

        self.handles.push(tokio::spawn(voice_loop(
            board.clone(),
            source,
            cancel_token.clone(),
        )));
        self.handles
            .push(tokio::spawn(facial_loop(board, cancel_token.clone())));

        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel and join every producer. After this resolves, no producer can
    /// touch the board again.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        for handle in self.handles.drain(..) {
            handle
                .await
                .context("producer task failed to join")?;
        }

        info!("all metric producers stopped");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.cancel_token.is_some()
    }
}

impl Default for ProducerSet {
    fn default() -> Self {
        Self::new()
    }
}

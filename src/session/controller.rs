use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::capture::SpectrumSource;
use crate::config::AssessmentRequest;
use crate::db::{AssessmentRecord, Database, RunStatus};
use crate::metrics::{MetricBoard, Snapshot};
use crate::producers::ProducerSet;
use crate::report::Report;
use crate::store::SnapshotSink;

use super::state::{RunPhase, SessionState};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub teacher_name: String,
    pub target_ms: u64,
}

/// Drives one assessment run at a time: owns the session state, the metric
/// producers, the once-per-second snapshot ticker, and the stop-time scoring.
///
/// The "exactly one live run" invariant is enforced here: `start` rejects
/// while a run is active, and every periodic task is cancelled structurally
/// on stop so a stale tick cannot revive a stopped run.
#[derive(Clone)]
pub struct AssessmentController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: Mutex<SessionState>,
    request: Mutex<Option<AssessmentRequest>>,
    board: MetricBoard,
    producers: Mutex<ProducerSet>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    last_report: Mutex<Option<Report>>,
    db: Database,
    sink: Arc<dyn SnapshotSink>,
}

impl AssessmentController {
    pub fn new(db: Database, sink: Arc<dyn SnapshotSink>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(SessionState::new()),
                request: Mutex::new(None),
                board: MetricBoard::new(),
                producers: Mutex::new(ProducerSet::new()),
                ticker: Mutex::new(None),
                last_report: Mutex::new(None),
                db,
                sink,
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.state.lock().await.clone()
    }

    pub async fn last_report(&self) -> Option<Report> {
        self.inner.last_report.lock().await.clone()
    }

    /// Validate the request and start a run. Rejects while another run is
    /// active. The spectrum source is handed to the voice producer; pass
    /// `None` to run fully simulated.
    pub async fn start(
        &self,
        request: AssessmentRequest,
        source: Option<Box<dyn SpectrumSource>>,
    ) -> Result<SessionInfo> {
        request.validate()?;

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let target_ms = request.duration_ms();

        // Claim the single run slot under one guard, before the first
        // database await: a concurrent start must observe Running here, not
        // slip in between a bare check and a later begin.
        {
            let mut state = self.inner.state.lock().await;
            if state.phase == RunPhase::Running {
                bail!("assessment already active");
            }
            state.begin(session_id.clone(), target_ms, started_at, Instant::now());
        }

        let record = AssessmentRecord {
            id: session_id.clone(),
            teacher_name: request.teacher_name.clone(),
            teacher_email: request.teacher_email.clone(),
            institution: request.institution.clone(),
            subject: request.subject.clone(),
            duration_minutes: request.duration_minutes,
            status: RunStatus::Pending,
            created_at: started_at,
            started_at: None,
            completed_at: None,
            snapshot_count: 0,
            overall_score: 0.0,
            eligibility: None,
        };
        let setup = async {
            self.inner.db.insert_assessment(&record).await?;
            self.inner.db.mark_started(&session_id, started_at).await?;

            self.inner.board.reset().await;
            *self.inner.request.lock().await = Some(request);
            *self.inner.last_report.lock().await = None;

            self.inner
                .producers
                .lock()
                .await
                .start(self.inner.board.clone(), source)
                .await
        };
        if let Err(err) = setup.await {
            // Release the claimed slot so a failed start does not wedge the
            // controller.
            self.inner.state.lock().await.reset();
            return Err(err);
        }

        self.spawn_ticker().await;

        info!(
            "assessment {} started for {} ({} min)",
            session_id,
            record.teacher_name,
            record.duration_minutes
        );

        Ok(SessionInfo {
            id: session_id,
            teacher_name: record.teacher_name,
            target_ms,
        })
    }

    /// Stop the run and compute its report exactly once.
    pub async fn stop(&self) -> Result<Report> {
        let report = self
            .finalize()
            .await?
            .ok_or_else(|| anyhow!("no active assessment to stop"))?;
        self.cancel_ticker().await;
        Ok(report)
    }

    /// Abort the run without producing a report.
    pub async fn cancel(&self) -> Result<()> {
        let cancelled_at = Utc::now();
        let session_id = {
            let mut state = self.inner.state.lock().await;
            if state.phase != RunPhase::Running {
                return Ok(());
            }
            let session_id = state
                .session_id
                .clone()
                .ok_or_else(|| anyhow!("running state missing session id"))?;
            state.cancel(cancelled_at);
            session_id
        };

        self.inner.producers.lock().await.stop().await?;
        self.cancel_ticker().await;

        self.inner.db.mark_cancelled(&session_id, cancelled_at).await?;
        info!("assessment {session_id} cancelled");
        Ok(())
    }

    /// Discard a stopped run's in-memory state so a new one can begin fresh.
    pub async fn reset(&self) -> Result<()> {
        {
            let state = self.inner.state.lock().await;
            if state.phase == RunPhase::Running {
                bail!("cannot reset while an assessment is running");
            }
        }
        self.inner.state.lock().await.reset();
        *self.inner.request.lock().await = None;
        *self.inner.last_report.lock().await = None;
        self.inner.board.reset().await;
        Ok(())
    }

    /// Shared stop path for explicit stop and the ticker's auto-finalize.
    /// Returns `Ok(None)` when no run was live (the race loser).
    async fn finalize(&self) -> Result<Option<Report>> {
        let completed_at = Utc::now();
        let (session_id, started_at) = {
            let mut state = self.inner.state.lock().await;
            if state.phase != RunPhase::Running {
                return Ok(None);
            }
            let session_id = state
                .session_id
                .clone()
                .ok_or_else(|| anyhow!("running state missing session id"))?;
            let started_at = state.started_at;
            state.stop(completed_at);
            (session_id, started_at)
        };

        // Halt every producer before reading the board so the final values
        // are frozen; a well-formed report is still produced if nothing ever
        // ticked.
        self.inner.producers.lock().await.stop().await?;

        let request = self
            .inner
            .request
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("running state missing request"))?;
        let values = self.inner.board.current().await;
        let snapshot_count = self.inner.db.snapshot_count(&session_id).await?;

        let report = Report::from_run(
            &session_id,
            &request,
            started_at,
            completed_at,
            snapshot_count,
            &values,
        );

        self.inner
            .db
            .save_report(
                &session_id,
                &report.clamped_scores(),
                report.eligibility,
                &report.recommendations,
                completed_at,
            )
            .await?;

        info!(
            "assessment {} completed: overall={:.1} tier={}",
            session_id,
            report.clamped_scores().overall_score,
            report.eligibility.as_str()
        );

        *self.inner.last_report.lock().await = Some(report.clone());
        Ok(Some(report))
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.inner.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(SNAPSHOT_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The interval's immediate first tick would snapshot the board
            // before any producer ran; skip it.
            interval.tick().await;

            loop {
                interval.tick().await;

                // The state lock is held across the append: finalize flips
                // the phase under the same lock, so once it runs no snapshot
                // can still be mid-write when it reads the stored count.
                let (session_id, target_reached) = {
                    let state = controller.inner.state.lock().await;
                    if state.phase != RunPhase::Running {
                        break;
                    }
                    let Some(session_id) = state.session_id.clone() else {
                        break;
                    };

                    let values = controller.inner.board.current().await;
                    let snapshot = Snapshot::of(&session_id, Utc::now(), &values);
                    if let Err(err) = controller.inner.sink.append(&snapshot).await {
                        error!("failed to persist snapshot for {session_id}: {err:#}");
                    }

                    (session_id, state.current_active_ms() >= state.target_ms)
                };

                if target_reached {
                    match controller.finalize().await {
                        Ok(Some(_)) => info!("assessment {session_id} reached its target duration"),
                        Ok(None) => {}
                        Err(err) => warn!("auto-finalize failed for {session_id}: {err:#}"),
                    }
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.inner.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

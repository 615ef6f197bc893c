use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;

mod migrations;
mod models;

pub use models::{AssessmentRecord, RunStatus};

use migrations::run_migrations;

use crate::metrics::Snapshot;
use crate::scoring::{Eligibility, Priority, Recommendation, ScoreBreakdown};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

fn to_u64(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("value {value} is negative"))
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn status_from_str(value: &str) -> Result<RunStatus> {
    match value {
        "pending" => Ok(RunStatus::Pending),
        "in-progress" => Ok(RunStatus::InProgress),
        "completed" => Ok(RunStatus::Completed),
        "cancelled" => Ok(RunStatus::Cancelled),
        _ => Err(anyhow!("unknown run status '{value}'")),
    }
}

fn priority_from_str(value: &str) -> Priority {
    match value {
        "high" => Priority::High,
        "low" => Priority::Low,
        _ => Priority::Medium,
    }
}

/// Handle to the dedicated SQLite worker thread. All access funnels through
/// an mpsc command queue; callers get their results back on oneshot channels.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("lectern-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(
                            Err(anyhow::Error::new(err).context("failed to open SQLite database")),
                        );
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn insert_assessment(&self, record: &AssessmentRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO assessments (id, teacher_name, teacher_email, institution, subject,
                                          duration_minutes, status, created_at, started_at,
                                          completed_at, snapshot_count, overall_score, eligibility)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.id,
                    record.teacher_name,
                    record.teacher_email,
                    record.institution,
                    record.subject,
                    record.duration_minutes,
                    record.status.as_str(),
                    record.created_at.to_rfc3339(),
                    record.started_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.completed_at.as_ref().map(|dt| dt.to_rfc3339()),
                    to_i64(record.snapshot_count)?,
                    record.overall_score,
                    record.eligibility,
                ],
            )
            .with_context(|| "failed to insert assessment")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_started(&self, assessment_id: &str, started_at: DateTime<Utc>) -> Result<()> {
        let assessment_id = assessment_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE assessments SET status = 'in-progress', started_at = ?1 WHERE id = ?2",
                params![started_at.to_rfc3339(), assessment_id],
            )
            .with_context(|| "failed to mark assessment started")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_cancelled(
        &self,
        assessment_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> Result<()> {
        let assessment_id = assessment_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE assessments SET status = 'cancelled', completed_at = ?1 WHERE id = ?2",
                params![cancelled_at.to_rfc3339(), assessment_id],
            )
            .with_context(|| "failed to mark assessment cancelled")?;
            Ok(())
        })
        .await
    }

    /// Append one per-second snapshot row and bump the run's counter.
    pub async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let payload =
            serde_json::to_string(snapshot).context("failed to serialize snapshot payload")?;
        let assessment_id = snapshot.session_id.clone();
        let timestamp = snapshot.timestamp.to_rfc3339();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO snapshots (assessment_id, timestamp, payload) VALUES (?1, ?2, ?3)",
                params![assessment_id, timestamp, payload],
            )
            .with_context(|| "failed to insert snapshot")?;
            tx.execute(
                "UPDATE assessments SET snapshot_count = snapshot_count + 1 WHERE id = ?1",
                params![assessment_id],
            )
            .with_context(|| "failed to bump snapshot count")?;
            tx.commit().context("failed to commit snapshot append")?;
            Ok(())
        })
        .await
    }

    /// Persist the final scores, tier, and recommendation rows in one
    /// transaction, and mark the run completed.
    pub async fn save_report(
        &self,
        assessment_id: &str,
        scores: &ScoreBreakdown,
        eligibility: Eligibility,
        recommendations: &[Recommendation],
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let assessment_id = assessment_id.to_string();
        let scores = *scores;
        let recommendations = recommendations.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE assessments
                 SET status = 'completed',
                     completed_at = ?1,
                     overall_score = ?2,
                     voice_score = ?3,
                     facial_score = ?4,
                     teaching_score = ?5,
                     eligibility = ?6
                 WHERE id = ?7",
                params![
                    completed_at.to_rfc3339(),
                    scores.overall_score,
                    scores.voice_score,
                    scores.facial_score,
                    scores.teaching_score,
                    eligibility.as_str(),
                    assessment_id,
                ],
            )
            .with_context(|| "failed to store assessment result")?;

            for rec in &recommendations {
                tx.execute(
                    "INSERT INTO recommendations (assessment_id, category, priority, title, description)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        assessment_id,
                        rec.category,
                        rec.priority.as_str(),
                        rec.title,
                        rec.description,
                    ],
                )
                .with_context(|| "failed to insert recommendation")?;
            }

            tx.commit().context("failed to commit report")?;
            Ok(())
        })
        .await
    }

    pub async fn get_assessment(&self, assessment_id: &str) -> Result<Option<AssessmentRecord>> {
        let assessment_id = assessment_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, teacher_name, teacher_email, institution, subject, duration_minutes,
                        status, created_at, started_at, completed_at, snapshot_count,
                        overall_score, eligibility
                 FROM assessments WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![assessment_id])?;
            if let Some(row) = rows.next()? {
                Ok(Some(row_to_record(row)?))
            } else {
                Ok(None)
            }
        })
        .await
    }

    pub async fn get_recommendations(&self, assessment_id: &str) -> Result<Vec<Recommendation>> {
        let assessment_id = assessment_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT category, priority, title, description
                 FROM recommendations WHERE assessment_id = ?1 ORDER BY id",
            )?;

            let mut rows = stmt.query(params![assessment_id])?;
            let mut recommendations = Vec::new();
            while let Some(row) = rows.next()? {
                recommendations.push(Recommendation {
                    category: row.get::<_, String>(0)?,
                    priority: priority_from_str(&row.get::<_, String>(1)?),
                    title: row.get::<_, String>(2)?,
                    description: row.get::<_, String>(3)?,
                });
            }
            Ok(recommendations)
        })
        .await
    }

    pub async fn snapshot_count(&self, assessment_id: &str) -> Result<u64> {
        let assessment_id = assessment_id.to_string();
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM snapshots WHERE assessment_id = ?1",
                params![assessment_id],
                |row| row.get(0),
            )?;
            to_u64(count)
        })
        .await
    }

    pub async fn list_assessments(&self) -> Result<Vec<AssessmentRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, teacher_name, teacher_email, institution, subject, duration_minutes,
                        status, created_at, started_at, completed_at, snapshot_count,
                        overall_score, eligibility
                 FROM assessments ORDER BY created_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<AssessmentRecord> {
    Ok(AssessmentRecord {
        id: row.get::<_, String>(0)?,
        teacher_name: row.get::<_, String>(1)?,
        teacher_email: row.get::<_, Option<String>>(2)?,
        institution: row.get::<_, String>(3)?,
        subject: row.get::<_, String>(4)?,
        duration_minutes: row.get::<_, u32>(5)?,
        status: status_from_str(&row.get::<_, String>(6)?)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        started_at: row
            .get::<_, Option<String>>(8)?
            .map(|s| parse_datetime(&s))
            .transpose()?,
        completed_at: row
            .get::<_, Option<String>>(9)?
            .map(|s| parse_datetime(&s))
            .transpose()?,
        snapshot_count: to_u64(row.get::<_, i64>(10)?)?,
        overall_score: row.get::<_, f64>(11)?,
        eligibility: row.get::<_, Option<String>>(12)?,
    })
}

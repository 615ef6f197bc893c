//! lectern: a teacher assessment engine.
//!
//! Three independent periodic producers (voice, facial/engagement, teaching
//! quality) feed a shared metric board; a once-per-second sampler appends
//! timestamped snapshots through a durable two-tier sink; stopping the run
//! scores the final board into an eligibility report.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod db;
pub mod metrics;
pub mod producers;
pub mod report;
pub mod scoring;
pub mod session;
pub mod store;
pub mod utils;

pub use capture::SpectrumSource;
pub use config::{AssessmentRequest, RunConfig};
pub use db::Database;
pub use report::Report;
pub use scoring::Eligibility;
pub use session::{AssessmentController, RunPhase};
pub use store::{RemoteSink, SnapshotSink, TieredSink};

pub mod controller;
pub mod state;

pub use controller::{AssessmentController, SessionInfo};
pub use state::{RunPhase, SessionState};

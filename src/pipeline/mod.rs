// ABOUTME: Pipeline core: stage execution, deploy swap, orchestration, escalation.
// ABOUTME: Turns a verified event into an ordered sequence of engine operations.

mod error;
mod escalate;
mod locks;
mod orchestrator;
mod run;
mod stage;
mod swap;

pub use error::StageError;
pub use escalate::{FailureEscalator, format_report};
pub use locks::LockTable;
pub use orchestrator::PipelineOrchestrator;
pub use run::{Outcome, PipelineRun, StageResult};
pub use stage::StageExecutor;
pub use swap::DeploySwapCoordinator;

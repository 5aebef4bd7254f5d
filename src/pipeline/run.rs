// ABOUTME: Result records for stages and whole pipeline runs.
// ABOUTME: A PipelineRun is constructed sealed; it cannot be mutated after.

use crate::config::StageKind;
use crate::types::{ProjectIdentity, VerifiedEvent};

/// Verdict of a stage or a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// What a single stage produced.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: StageKind,
    pub output: String,
    pub duration_ms: u64,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
    /// Best-effort cleanup failures. These never overturn the primary
    /// outcome; they are surfaced in the report instead.
    pub warnings: Vec<String>,
}

impl StageResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// A sealed record of one pipeline run.
///
/// The orchestrator accumulates stage results privately and constructs
/// this once, at finalization, so the "no mutation after the verdict is
/// set" invariant holds by construction: every field is read-only from
/// the moment the value exists.
#[derive(Debug)]
pub struct PipelineRun {
    event: VerifiedEvent,
    identity: ProjectIdentity,
    results: Vec<StageResult>,
    verdict: Outcome,
    total_duration_ms: u64,
}

impl PipelineRun {
    /// Seal a finished run. The verdict is Success only when every
    /// configured stage ran and succeeded.
    pub(crate) fn seal(
        event: VerifiedEvent,
        identity: ProjectIdentity,
        results: Vec<StageResult>,
        configured_stages: usize,
        total_duration_ms: u64,
    ) -> Self {
        debug_assert!(results.len() <= configured_stages);

        let verdict = if results.len() == configured_stages
            && results.iter().all(StageResult::is_success)
        {
            Outcome::Success
        } else {
            Outcome::Failure
        };

        Self {
            event,
            identity,
            results,
            verdict,
            total_duration_ms,
        }
    }

    pub fn event(&self) -> &VerifiedEvent {
        &self.event
    }

    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn verdict(&self) -> Outcome {
        self.verdict
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// The stage that sank the run, if any.
    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.results.iter().find(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> VerifiedEvent {
        VerifiedEvent {
            owner_name: "acme".into(),
            repo_name: "api".into(),
            full_name: "acme/api".into(),
            commit_id: "abc123".into(),
            git_ref: "refs/heads/main".into(),
            raw_payload: String::new(),
        }
    }

    fn result(stage: StageKind, outcome: Outcome) -> StageResult {
        StageResult {
            stage,
            output: String::new(),
            duration_ms: 1,
            outcome,
            error_detail: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn all_stages_succeeding_seals_success() {
        let run = PipelineRun::seal(
            event(),
            ProjectIdentity::new("acme", "api").unwrap(),
            vec![
                result(StageKind::Build, Outcome::Success),
                result(StageKind::Deploy, Outcome::Success),
            ],
            2,
            10,
        );
        assert_eq!(run.verdict(), Outcome::Success);
        assert!(run.failed_stage().is_none());
    }

    #[test]
    fn truncated_run_seals_failure() {
        // Two stages configured, only one recorded: the run stopped early.
        let run = PipelineRun::seal(
            event(),
            ProjectIdentity::new("acme", "api").unwrap(),
            vec![result(StageKind::Build, Outcome::Failure)],
            2,
            10,
        );
        assert_eq!(run.verdict(), Outcome::Failure);
        assert_eq!(run.failed_stage().unwrap().stage, StageKind::Build);
    }
}

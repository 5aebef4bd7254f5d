// ABOUTME: FailureEscalator: finalizes a run by persisting and notifying.
// ABOUTME: Escalation ends only this run's path, never the hosting process.

use chrono::Utc;
use std::sync::Arc;

use crate::sinks::{LogSink, NotificationSink};

use super::run::{Outcome, PipelineRun};

/// Render the human-readable report for a sealed run.
///
/// A Failure report names the failing stage and carries its error
/// detail; partial state is never reported as success.
pub fn format_report(run: &PipelineRun) -> String {
    let verdict = match run.verdict() {
        Outcome::Success => "SUCCESS",
        Outcome::Failure => "FAILURE",
    };

    let mut report = format!(
        "Pipeline {} for {} ({} @ {})\nFinished {} in {}ms\n",
        verdict,
        run.identity(),
        run.event().git_ref,
        run.event().short_commit(),
        Utc::now().to_rfc3339(),
        run.total_duration_ms(),
    );

    if let Some(failed) = run.failed_stage() {
        report.push_str(&format!(
            "Failed at the {} stage: {}\n",
            failed.stage,
            failed.error_detail.as_deref().unwrap_or("unknown error"),
        ));
    }

    for result in run.results() {
        let outcome = match result.outcome {
            Outcome::Success => "ok",
            Outcome::Failure => "FAILED",
        };
        report.push_str(&format!(
            "\n=== {} stage [{}] ({}ms) ===\n",
            result.stage, outcome, result.duration_ms
        ));
        report.push_str(&result.output);
        if !result.output.ends_with('\n') && !result.output.is_empty() {
            report.push('\n');
        }
        if let Some(ref detail) = result.error_detail {
            report.push_str(&format!("Error: {}\n", detail));
        }
        for warning in &result.warnings {
            report.push_str(&format!("Warning: {}\n", warning));
        }
    }

    report
}

/// Finalizes every run, success or failure: persist the report, then
/// notify if a sink is configured.
///
/// Neither collaborator failing may abort the process or block the
/// processing of unrelated events; errors here are logged and dropped.
pub struct FailureEscalator {
    log_sink: Arc<dyn LogSink>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl FailureEscalator {
    pub fn new(log_sink: Arc<dyn LogSink>, notifier: Option<Arc<dyn NotificationSink>>) -> Self {
        Self { log_sink, notifier }
    }

    /// Seal-and-report: returns the report text for callers that want it.
    pub async fn finalize(&self, run: &PipelineRun) -> String {
        let report = format_report(run);

        match run.verdict() {
            Outcome::Success => {
                tracing::info!(
                    "Run for {} at {} finished successfully",
                    run.identity(),
                    run.event().short_commit()
                );
            }
            Outcome::Failure => {
                tracing::error!(
                    "Run for {} at {} failed: {}",
                    run.identity(),
                    run.event().short_commit(),
                    run.failed_stage()
                        .and_then(|r| r.error_detail.as_deref())
                        .unwrap_or("unknown error")
                );
            }
        }

        if let Err(e) = self
            .log_sink
            .persist(run.identity(), &run.event().commit_id, &report)
            .await
        {
            tracing::error!("Could not persist report for {}: {}", run.identity(), e);
        }

        if let Some(ref notifier) = self.notifier
            && let Err(e) = notifier.notify(&report).await
        {
            tracing::warn!("Could not deliver notification for {}: {}", run.identity(), e);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageKind;
    use crate::pipeline::run::StageResult;
    use crate::types::{ProjectIdentity, VerifiedEvent};

    fn event() -> VerifiedEvent {
        VerifiedEvent {
            owner_name: "acme".into(),
            repo_name: "api".into(),
            full_name: "acme/api".into(),
            commit_id: "abc123def".into(),
            git_ref: "refs/heads/main".into(),
            raw_payload: String::new(),
        }
    }

    fn run_with(results: Vec<StageResult>, configured: usize) -> PipelineRun {
        PipelineRun::seal(
            event(),
            ProjectIdentity::new("acme", "api").unwrap(),
            results,
            configured,
            42,
        )
    }

    #[test]
    fn failure_report_names_stage_and_detail() {
        let run = run_with(
            vec![
                StageResult {
                    stage: StageKind::Build,
                    output: "Project image created\n".into(),
                    duration_ms: 5,
                    outcome: Outcome::Success,
                    error_detail: None,
                    warnings: vec![],
                },
                StageResult {
                    stage: StageKind::Deploy,
                    output: String::new(),
                    duration_ms: 3,
                    outcome: Outcome::Failure,
                    error_detail: Some("start refused".into()),
                    warnings: vec![],
                },
            ],
            2,
        );

        let report = format_report(&run);
        assert!(report.contains("FAILURE"));
        assert!(report.contains("Failed at the deploy stage: start refused"));
        assert!(report.contains("acme-api"));
    }

    #[test]
    fn success_report_has_no_failure_line() {
        let run = run_with(
            vec![StageResult {
                stage: StageKind::Build,
                output: "done\n".into(),
                duration_ms: 5,
                outcome: Outcome::Success,
                error_detail: None,
                warnings: vec![],
            }],
            1,
        );

        let report = format_report(&run);
        assert!(report.contains("SUCCESS"));
        assert!(!report.contains("Failed at"));
    }

    #[test]
    fn warnings_are_surfaced() {
        let run = run_with(
            vec![StageResult {
                stage: StageKind::Test,
                output: "logs\n".into(),
                duration_ms: 5,
                outcome: Outcome::Success,
                error_detail: None,
                warnings: vec!["could not remove test image: in use".into()],
            }],
            1,
        );

        let report = format_report(&run);
        assert!(report.contains("Warning: could not remove test image: in use"));
        assert!(report.contains("SUCCESS"));
    }
}

// ABOUTME: External command execution for the compose pipeline path.
// ABOUTME: Narrow trait so control logic is testable without a real shell.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr. True interleaving is not preserved.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Runs an external command in a working directory.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        workdir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, CommandError>;
}

/// Real command runner backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        workdir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        tracing::debug!(
            "Running {} {} in {}",
            program,
            args.join(" "),
            workdir.display()
        );

        let output = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}

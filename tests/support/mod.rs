// ABOUTME: Test support utilities.
// ABOUTME: Recording mock runtime, scripted command runner, and in-memory sinks.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use slipway::exec::{CommandError, CommandOutput, CommandRunner};
use slipway::runtime::{
    BuildContext, ContainerDescriptor, ContainerState, RuntimeClient, RuntimeError,
};
use slipway::sinks::{LogSink, NotificationSink, SinkError};
use slipway::types::{ContainerHandle, ImageHandle, ProjectIdentity, VerifiedEvent};

/// Build a verified event the way the gateway would.
#[allow(dead_code)]
pub fn event(owner: &str, repo: &str, commit: &str) -> VerifiedEvent {
    VerifiedEvent {
        owner_name: owner.to_string(),
        repo_name: repo.to_string(),
        full_name: format!("{}/{}", owner, repo),
        commit_id: commit.to_string(),
        git_ref: "refs/heads/main".to_string(),
        raw_payload: String::new(),
    }
}

#[derive(Default)]
struct EngineState {
    /// name -> running
    containers: HashMap<String, bool>,
    images: HashSet<String>,
}

/// In-memory engine double.
///
/// Records every call as `op:arg` in order, keeps a tiny container/image
/// state machine so inspect/create/remove behave like the real engine,
/// and supports per-operation failure injection and delays.
#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<EngineState>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<HashMap<&'static str, String>>,
    delay: Mutex<HashMap<&'static str, Duration>>,
    exit_code: AtomicI64,
    /// When set, wait_for_exit errors and the container disappears, as
    /// if an operator removed it mid-teardown.
    vanish_on_wait: AtomicBool,
}

#[allow(dead_code)]
impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a running container, as left behind by an earlier deploy.
    pub fn with_running_container(self, name: &str) -> Self {
        self.state
            .lock()
            .containers
            .insert(name.to_string(), true);
        self
    }

    pub fn with_image(self, tag: &str) -> Self {
        self.state.lock().images.insert(tag.to_string());
        self
    }

    /// Make the named operation fail with the given message.
    pub fn fail_on(&self, op: &'static str, message: &str) {
        self.fail.lock().insert(op, message.to_string());
    }

    /// Sleep inside the named operation, to widen race windows.
    pub fn delay_on(&self, op: &'static str, delay: Duration) {
        self.delay.lock().insert(op, delay);
    }

    pub fn set_exit_code(&self, code: i64) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn vanish_on_wait(&self) {
        self.vanish_on_wait.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().containers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state.lock().containers.get(name).copied().unwrap_or(false)
    }

    async fn enter(&self, op: &'static str, arg: &str) -> Result<(), RuntimeError> {
        self.calls.lock().push(format!("{}:{}", op, arg));
        let delay = self.delay.lock().get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.fail.lock().get(op) {
            return Err(RuntimeError::OperationFailed(message.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl RuntimeClient for MockRuntime {
    async fn build_image(
        &self,
        tag: &str,
        _context: &BuildContext,
    ) -> Result<(ImageHandle, String), RuntimeError> {
        self.enter("build_image", tag).await?;
        self.state.lock().images.insert(tag.to_string());
        Ok((ImageHandle::new(tag), format!("built {}\n", tag)))
    }

    async fn remove_image(&self, tag: &str) -> Result<(), RuntimeError> {
        self.enter("remove_image", tag).await?;
        // Absent image is not an error, mirroring the engine adapter.
        self.state.lock().images.remove(tag);
        Ok(())
    }

    async fn create_container(
        &self,
        image_ref: &str,
        name: &str,
    ) -> Result<ContainerHandle, RuntimeError> {
        self.enter("create_container", name).await?;
        let mut state = self.state.lock();
        if state.containers.contains_key(name) {
            return Err(RuntimeError::OperationFailed(format!(
                "name {} already in use (409)",
                name
            )));
        }
        let _ = image_ref;
        state.containers.insert(name.to_string(), false);
        Ok(ContainerHandle::new(name))
    }

    async fn start_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.enter("start_container", handle.as_str()).await?;
        match self.state.lock().containers.get_mut(handle.as_str()) {
            Some(running) => {
                *running = true;
                Ok(())
            }
            None => Err(RuntimeError::OperationFailed(format!(
                "no such container {} (404)",
                handle
            ))),
        }
    }

    async fn wait_for_exit(&self, handle: &ContainerHandle) -> Result<i64, RuntimeError> {
        self.enter("wait_for_exit", handle.as_str()).await?;
        if self.vanish_on_wait.load(Ordering::SeqCst) {
            self.state.lock().containers.remove(handle.as_str());
            return Err(RuntimeError::OperationFailed(format!(
                "no such container {} (404)",
                handle
            )));
        }
        if let Some(running) = self.state.lock().containers.get_mut(handle.as_str()) {
            *running = false;
        }
        Ok(self.exit_code.load(Ordering::SeqCst))
    }

    async fn fetch_logs(&self, handle: &ContainerHandle) -> Result<String, RuntimeError> {
        self.enter("fetch_logs", handle.as_str()).await?;
        Ok(format!("logs of {}\n", handle))
    }

    async fn stop_container(
        &self,
        handle: &ContainerHandle,
        _timeout: Duration,
    ) -> Result<(), RuntimeError> {
        self.enter("stop_container", handle.as_str()).await?;
        if let Some(running) = self.state.lock().containers.get_mut(handle.as_str()) {
            *running = false;
        }
        Ok(())
    }

    async fn remove_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.enter("remove_container", handle.as_str()).await?;
        // Absent container is not an error.
        self.state.lock().containers.remove(handle.as_str());
        Ok(())
    }

    async fn inspect(&self, name: &str) -> Result<Option<ContainerDescriptor>, RuntimeError> {
        self.enter("inspect", name).await?;
        let state = self.state.lock();
        Ok(state.containers.get(name).map(|running| ContainerDescriptor {
            handle: ContainerHandle::new(name),
            name: name.to_string(),
            state: if *running {
                ContainerState::Running
            } else {
                ContainerState::Exited
            },
        }))
    }
}

/// Command runner that never touches a shell.
#[derive(Default)]
pub struct MockCommandRunner {
    pub invocations: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
    exit_code: AtomicI64,
}

#[allow(dead_code)]
impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_exit_code(&self, code: i64) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn invocations(&self) -> Vec<(PathBuf, String, Vec<String>)> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(
        &self,
        workdir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        self.invocations
            .lock()
            .push((workdir.to_path_buf(), program.to_string(), args.to_vec()));
        let code = self.exit_code.load(Ordering::SeqCst) as i32;
        Ok(CommandOutput {
            stdout: format!("{} {}\n", program, args.join(" ")),
            stderr: if code == 0 {
                String::new()
            } else {
                "compose failed\n".to_string()
            },
            exit_code: Some(code),
        })
    }
}

/// LogSink that keeps reports in memory.
#[derive(Default)]
pub struct MemoryLogSink {
    pub reports: Mutex<Vec<(String, String, String)>>,
}

#[allow(dead_code)]
impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, String, String)> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn persist(
        &self,
        identity: &ProjectIdentity,
        commit_id: &str,
        report: &str,
    ) -> Result<(), SinkError> {
        self.reports.lock().push((
            identity.to_string(),
            commit_id.to_string(),
            report.to_string(),
        ));
        Ok(())
    }
}

/// NotificationSink that records messages, optionally failing.
#[derive(Default)]
pub struct MemoryNotifier {
    pub messages: Mutex<Vec<String>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn notify(&self, report: &str) -> Result<(), SinkError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(SinkError::Notify("notifier offline".to_string()));
        }
        self.messages.lock().push(report.to_string());
        Ok(())
    }
}

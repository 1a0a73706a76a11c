//! Runs one administrative command against a set of director nodes.
//!
//! Every target is attempted on its own: a failing director never prevents the
//! others from receiving the command, and the batch as a whole cannot fail.
//! Failures are logged and reported back, never retried.

use super::AdminCommand;
use crate::config;
use crate::node::NodeSnapshot;
use crate::remote_exec::{ExecError, ExecOutput, RemoteExec};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct FanOutOptions {
    pub exec_timeout: Duration,
    /// Number of targets executed at the same time, `1` runs them one after another.
    pub concurrency: usize,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self::from(&config::FanOut::default())
    }
}

impl From<&config::FanOut> for FanOutOptions {
    fn from(config: &config::FanOut) -> Self {
        Self {
            exec_timeout: config.exec_timeout,
            concurrency: config.concurrency.max(1),
        }
    }
}

#[derive(Debug)]
pub struct TargetResult {
    pub target: NodeSnapshot,
    pub outcome: Result<ExecOutput, ExecError>,
}

impl TargetResult {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct FanOutReport {
    pub command: AdminCommand,
    pub results: Vec<TargetResult>,
}

impl FanOutReport {
    pub fn failures(&self) -> impl Iterator<Item = &TargetResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

#[tracing::instrument(
    name = "fan_out::execute",
    skip(command, targets, exec, options),
    fields(command = %command, targets = targets.len())
)]
pub async fn execute(
    command: AdminCommand,
    targets: Vec<NodeSnapshot>,
    exec: &dyn RemoteExec,
    options: FanOutOptions,
) -> FanOutReport {
    let results = stream::iter(targets)
        .map(|target| execute_on_target(&command, target, exec, options.exec_timeout))
        .buffer_unordered(options.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let report = FanOutReport { command, results };

    info!(
        targets = report.results.len(),
        failed = report.failure_count(),
        "Finished command fan-out"
    );

    report
}

async fn execute_on_target(
    command: &AdminCommand,
    target: NodeSnapshot,
    exec: &dyn RemoteExec,
    timeout: Duration,
) -> TargetResult {
    info!(node = %target.identity, %command, "Executing command on director");

    let outcome = match tokio::time::timeout(timeout, exec.exec(&target, command)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ExecError::Timeout { timeout }),
    };

    match &outcome {
        Ok(output) => info!(
            node = %target.identity,
            stdout = output.stdout.trim_end(),
            "Command succeeded"
        ),
        Err(e) => warn!(
            node = %target.identity,
            error = %e,
            "Command failed"
        ),
    }

    TargetResult { target, outcome }
}

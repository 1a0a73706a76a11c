use super::{ExecError, ExecOutput, RemoteExec};
use crate::membership::AdminCommand;
use crate::node::NodeSnapshot;
use async_trait::async_trait;
use tracing::info;

/// Dry-run executor that only logs the commands it would have run.
#[derive(Debug, Clone)]
pub struct DryRunRemoteExec;

#[async_trait]
impl RemoteExec for DryRunRemoteExec {
    async fn exec(
        &self,
        target: &NodeSnapshot,
        command: &AdminCommand,
    ) -> Result<ExecOutput, ExecError> {
        info!(node = %target.identity, %command, "Dry run, not executing command");

        Ok(ExecOutput::default())
    }
}

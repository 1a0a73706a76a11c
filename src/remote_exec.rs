mod kubernetes;
mod dry_run;

use crate::config;
use crate::membership::AdminCommand;
use crate::node::NodeSnapshot;
use crate::AppConfig;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

pub use kubernetes::KubernetesRemoteExec;
pub use self::dry_run::DryRunRemoteExec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ExecError {
    #[error("Command did not finish within {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("Command failed: {message} (stderr: {stderr:?})")]
    CommandFailed { message: String, stderr: String },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Runs administrative commands inside a node.
#[async_trait]
pub trait RemoteExec: Send + Sync + Debug {
    async fn exec(
        &self,
        target: &NodeSnapshot,
        command: &AdminCommand,
    ) -> Result<ExecOutput, ExecError>;
}

pub fn build_from_config(
    config: AppConfig,
    client: Option<::kube::Client>,
) -> anyhow::Result<Arc<dyn RemoteExec>> {
    Ok(match &config.remote_exec {
        config::RemoteExec::DryRun => Arc::new(DryRunRemoteExec),
        config::RemoteExec::Kubernetes { shell, container } => {
            let client = client.ok_or_else(|| {
                anyhow::anyhow!("Kubernetes remote exec requires a Kubernetes client")
            })?;

            Arc::new(KubernetesRemoteExec::new(
                client,
                shell.clone(),
                container.clone(),
            ))
        }
    })
}

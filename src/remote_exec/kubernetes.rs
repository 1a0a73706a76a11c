use super::{ExecError, ExecOutput, RemoteExec};
use crate::membership::AdminCommand;
use crate::node::NodeSnapshot;
use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::Client;
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Runs commands through the `exec` subresource of the target pod.
pub struct KubernetesRemoteExec {
    client: Client,
    shell: String,
    container: Option<String>,
}

impl KubernetesRemoteExec {
    pub fn new(client: Client, shell: String, container: Option<String>) -> Self {
        Self {
            client,
            shell,
            container,
        }
    }

    fn attach_params(&self) -> AttachParams {
        let params = AttachParams::default()
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        match &self.container {
            Some(container) => params.container(container.clone()),
            None => params,
        }
    }
}

impl fmt::Debug for KubernetesRemoteExec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KubernetesRemoteExec (shell: {}, container: {:?})",
            self.shell, self.container
        )
    }
}

#[async_trait]
impl RemoteExec for KubernetesRemoteExec {
    #[tracing::instrument(
        name = "KubernetesRemoteExec::exec",
        skip(self, target, command),
        fields(node = %target.identity)
    )]
    async fn exec(
        &self,
        target: &NodeSnapshot,
        command: &AdminCommand,
    ) -> Result<ExecOutput, ExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &target.identity.namespace);
        let args = vec![
            self.shell.clone(),
            "-c".to_string(),
            command.as_str().to_string(),
        ];

        let mut process = pods
            .exec(target.name(), args, &self.attach_params())
            .await
            .with_context(|| format!("Failed to start exec in pod {}", target.identity))?;

        let status = process.take_status();
        let (stdout, stderr) = tokio::try_join!(
            read_to_string(process.stdout()),
            read_to_string(process.stderr())
        )
        .context("Failed to read exec output")?;

        let status = match status {
            Some(status) => status.await,
            None => None,
        };

        process
            .join()
            .await
            .context("Failed to finish exec session")?;

        debug!(?status, %stdout, %stderr, "Exec finished");

        match status {
            Some(s) if s.status.as_deref() != Some("Success") => Err(ExecError::CommandFailed {
                message: s
                    .message
                    .or(s.reason)
                    .unwrap_or_else(|| "unknown failure".into()),
                stderr,
            }),
            _ => Ok(ExecOutput { stdout, stderr }),
        }
    }
}

async fn read_to_string(reader: Option<impl AsyncRead + Unpin>) -> std::io::Result<String> {
    let mut output = String::new();

    if let Some(mut reader) = reader {
        reader.read_to_string(&mut output).await?;
    }

    Ok(output)
}

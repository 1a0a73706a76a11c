mod kubernetes;
mod mock;

use crate::config;
use crate::node::{NodeSnapshot, RoleMatcher};
use crate::AppConfig;
use act_zero::runtimes::tokio::spawn_actor;
use act_zero::{call, upcast, Actor, ActorResult, Addr};
use async_trait::async_trait;

pub use kubernetes::KubernetesDirectorDiscovery;
pub use mock::MockDirectorDiscovery;

#[derive(thiserror::Error, Debug)]
#[error("Failed to list director nodes: {message}")]
pub struct ListError {
    message: String,
}

/// Lists the director nodes known to the orchestrator, regardless of their phase.
#[async_trait]
pub trait DirectorDiscoveryProvider: Actor {
    async fn discover_directors(&mut self) -> ActorResult<Vec<NodeSnapshot>>;
}

/// Queries the provider for the directors that are able to take commands right now.
#[tracing::instrument(name = "director::current_directors", skip(provider))]
pub async fn current_directors(
    provider: Addr<dyn DirectorDiscoveryProvider>,
) -> Result<Vec<NodeSnapshot>, ListError> {
    let directors = call!(provider.discover_directors())
        .await
        .map_err(|e| ListError {
            message: e.to_string(),
        })?;

    Ok(directors.into_iter().filter(|d| d.is_running()).collect())
}

pub fn build_from_config(
    config: AppConfig,
    client: Option<::kube::Client>,
) -> anyhow::Result<Addr<dyn DirectorDiscoveryProvider>> {
    let roles = RoleMatcher::new(&config.worker_prefix, &config.director_prefix);

    Ok(match &config.director_discovery {
        config::DirectorDiscovery::Mock {
            directors,
            namespace,
        } => upcast!(spawn_actor(MockDirectorDiscovery::new(
            directors.clone(),
            namespace.clone(),
            roles
        ))),
        config::DirectorDiscovery::Kubernetes { namespace, .. } => {
            let client = client.ok_or_else(|| {
                anyhow::anyhow!("Kubernetes director discovery requires a Kubernetes client")
            })?;

            upcast!(spawn_actor(KubernetesDirectorDiscovery::new(
                client,
                namespace,
                config.director_label_selector(),
                roles,
            )))
        }
    })
}

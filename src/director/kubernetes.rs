use super::DirectorDiscoveryProvider;
use crate::actor;
use crate::node::{NodeSnapshot, RoleMatcher};
use act_zero::{Actor, ActorError, ActorResult, Addr, Produces};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::Client;
use std::fmt;
use tracing::{info, warn};

/// Lists director pods by label selector within one namespace.
pub struct KubernetesDirectorDiscovery {
    pods: Api<Pod>,
    namespace: String,
    label_selector: String,
    roles: RoleMatcher,
}

impl KubernetesDirectorDiscovery {
    pub fn new(client: Client, namespace: &str, label_selector: String, roles: RoleMatcher) -> Self {
        Self {
            pods: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            label_selector,
            roles,
        }
    }
}

impl fmt::Display for KubernetesDirectorDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KubernetesDirectorDiscovery ({}, {})",
            self.namespace, self.label_selector
        )
    }
}

#[async_trait]
impl Actor for KubernetesDirectorDiscovery {
    #[tracing::instrument(
        name = "KubernetesDirectorDiscovery::started",
        skip(self, _addr),
        fields(namespace = %self.namespace, label_selector = %self.label_selector)
    )]
    async fn started(&mut self, _addr: Addr<Self>) -> ActorResult<()>
    where
        Self: Sized,
    {
        info!("Started");

        Produces::ok(())
    }

    async fn error(&mut self, error: ActorError) -> bool {
        actor::handle_error(error)
    }
}

#[async_trait]
impl DirectorDiscoveryProvider for KubernetesDirectorDiscovery {
    #[tracing::instrument(
        name = "KubernetesDirectorDiscovery::discover_directors",
        skip(self),
        fields(namespace = %self.namespace, label_selector = %self.label_selector)
    )]
    async fn discover_directors(&mut self) -> ActorResult<Vec<NodeSnapshot>> {
        let pods = self
            .pods
            .list(&ListParams::default().labels(&self.label_selector))
            .await
            .map_err(anyhow::Error::new)
            .map_err(actor::Error::from)?;

        let directors = pods
            .items
            .iter()
            .map(|pod| NodeSnapshot::from_pod(pod, &self.roles))
            .inspect(|snapshot| {
                if snapshot.role() != crate::node::NodeRole::Director {
                    warn!(
                        node = snapshot.name(),
                        "Label selector matched a pod without the director prefix"
                    );
                }
            })
            .collect();

        Produces::ok(directors)
    }
}

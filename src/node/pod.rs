use super::{NodeIdentity, NodePhase, NodeSnapshot, RoleMatcher};
use k8s_openapi::api::core::v1::Pod;
use std::net::IpAddr;
use tracing::warn;

impl NodeSnapshot {
    pub fn from_pod(pod: &Pod, roles: &RoleMatcher) -> Self {
        let name = pod.metadata.name.clone().unwrap_or_default();
        let namespace = pod
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".into());
        let status = pod.status.as_ref();

        let phase = status
            .and_then(|s| s.phase.as_deref())
            .map(|phase| phase.parse().unwrap_or(NodePhase::Other(phase.into())))
            .unwrap_or_else(|| NodePhase::Other(String::new()));

        let address = status
            .and_then(|s| s.pod_ip.as_deref())
            .filter(|ip| !ip.is_empty())
            .and_then(|ip| match ip.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(e) => {
                    warn!(pod = name.as_str(), ip, error = %e, "Failed to parse pod ip");
                    None
                }
            });

        let readiness = status
            .and_then(|s| s.container_statuses.as_ref())
            .and_then(|statuses| statuses.first())
            .map(|container| container.ready);

        Self {
            identity: NodeIdentity {
                role: roles.resolve(&name),
                name,
                namespace,
            },
            phase,
            address,
            readiness,
        }
    }
}

use super::DirectorDiscoveryProvider;
use crate::node::{NodeIdentity, NodePhase, NodeSnapshot, RoleMatcher};
use act_zero::{Actor, ActorResult, Addr, Produces};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

/// Serves a fixed set of directors, all running unless told otherwise.
pub struct MockDirectorDiscovery {
    directors: Vec<String>,
    namespace: String,
    roles: RoleMatcher,
    phases: HashMap<String, NodePhase>,
}

impl MockDirectorDiscovery {
    pub fn new(directors: Vec<String>, namespace: String, roles: RoleMatcher) -> Self {
        Self {
            directors,
            namespace,
            roles,
            phases: HashMap::new(),
        }
    }

    pub fn with_phase(mut self, director: impl Into<String>, phase: NodePhase) -> Self {
        self.phases.insert(director.into(), phase);
        self
    }

    fn snapshot(&self, name: &str) -> NodeSnapshot {
        NodeSnapshot {
            identity: NodeIdentity {
                name: name.to_string(),
                namespace: self.namespace.clone(),
                role: self.roles.resolve(name),
            },
            phase: self
                .phases
                .get(name)
                .cloned()
                .unwrap_or(NodePhase::Running),
            address: None,
            readiness: Some(true),
        }
    }
}

#[async_trait]
impl Actor for MockDirectorDiscovery {
    async fn started(&mut self, _addr: Addr<Self>) -> ActorResult<()>
    where
        Self: Sized,
    {
        info!(directors = ?self.directors, "Started MockDirectorDiscovery");

        Produces::ok(())
    }
}

#[async_trait]
impl DirectorDiscoveryProvider for MockDirectorDiscovery {
    async fn discover_directors(&mut self) -> ActorResult<Vec<NodeSnapshot>> {
        Produces::ok(self.directors.iter().map(|d| self.snapshot(d)).collect())
    }
}

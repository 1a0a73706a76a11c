mod pod;

use std::fmt;
use std::net::IpAddr;
use strum::{Display, EnumString};

/// Part a node plays in the director cluster, resolved once from its name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeRole {
    Worker,
    Director,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum NodePhase {
    Pending,
    Running,
    #[strum(default)]
    Other(String),
}

impl fmt::Display for NodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePhase::Pending => f.write_str("Pending"),
            NodePhase::Running => f.write_str("Running"),
            NodePhase::Other(phase) => f.write_str(phase),
        }
    }
}

/// Resolves node roles by substring match against the configured name prefixes.
#[derive(Debug, Clone)]
pub struct RoleMatcher {
    worker_prefix: String,
    director_prefix: String,
}

impl RoleMatcher {
    pub fn new(worker_prefix: impl Into<String>, director_prefix: impl Into<String>) -> Self {
        Self {
            worker_prefix: worker_prefix.into(),
            director_prefix: director_prefix.into(),
        }
    }

    pub fn resolve(&self, name: &str) -> NodeRole {
        if name.contains(&self.worker_prefix) {
            NodeRole::Worker
        } else if name.contains(&self.director_prefix) {
            NodeRole::Director
        } else {
            NodeRole::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub name: String,
    pub namespace: String,
    pub role: NodeRole,
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub identity: NodeIdentity,
    pub phase: NodePhase,
    pub address: Option<IpAddr>,
    /// Readiness of the first container, absent while no container status is reported.
    pub readiness: Option<bool>,
}

impl NodeSnapshot {
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn role(&self) -> NodeRole {
        self.identity.role
    }

    pub fn is_running(&self) -> bool {
        self.phase == NodePhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> RoleMatcher {
        RoleMatcher::new("yartu-dovecot", "yartu-director")
    }

    #[test]
    fn test_role_resolution() {
        let matcher = matcher();

        assert_eq!(NodeRole::Worker, matcher.resolve("yartu-dovecot-3"));
        assert_eq!(NodeRole::Director, matcher.resolve("yartu-director-1"));
        assert_eq!(NodeRole::Unknown, matcher.resolve("postgres-0"));
    }

    #[test]
    fn test_role_resolution_matches_substrings() {
        let matcher = matcher();

        assert_eq!(NodeRole::Worker, matcher.resolve("mail-yartu-dovecot-7f9c"));
        assert_eq!(NodeRole::Director, matcher.resolve("x-yartu-director"));
    }

    #[test]
    fn test_worker_prefix_wins_over_director_prefix() {
        let matcher = RoleMatcher::new("dovecot", "director");

        assert_eq!(NodeRole::Worker, matcher.resolve("director-dovecot-1"));
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!(NodePhase::Pending, "Pending".parse::<NodePhase>().unwrap());
        assert_eq!(NodePhase::Running, "Running".parse::<NodePhase>().unwrap());
        assert_eq!(
            NodePhase::Other("Succeeded".into()),
            "Succeeded".parse::<NodePhase>().unwrap()
        );
    }
}

use super::Action;
use crate::node::{NodeRole, NodeSnapshot};
use std::fmt;
use std::net::IpAddr;
use strum::Display;
use tracing::warn;

/// Shell command understood by the director administration tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand(String);

impl AdminCommand {
    pub fn add_member(address: IpAddr) -> Self {
        Self(format!("doveadm director add {}", address))
    }

    /// Marks the member down, flushes its users and removes it, in that order.
    pub fn remove_member(address: IpAddr) -> Self {
        Self(format!(
            "doveadm director update {ip} 0 && doveadm director flush {ip} && doveadm director remove {ip}",
            ip = address
        ))
    }

    pub fn reload() -> Self {
        Self("doveadm reload".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AdminCommand {
    fn from(command: String) -> Self {
        Self(command)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoOpReason {
    DirectorRemoved,
    BecameUnready,
    MissingAddress,
    UnknownRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    Command(AdminCommand),
    NoOp(NoOpReason),
}

pub fn derive(action: &Action) -> Derivation {
    match (action.role(), action) {
        (NodeRole::Unknown, _) => Derivation::NoOp(NoOpReason::UnknownRole),
        (NodeRole::Director, Action::Removed { .. }) => {
            Derivation::NoOp(NoOpReason::DirectorRemoved)
        }
        (NodeRole::Director, Action::ReadinessChanged { current, .. }) => {
            if became_ready(current) {
                Derivation::Command(AdminCommand::reload())
            } else {
                Derivation::NoOp(NoOpReason::BecameUnready)
            }
        }
        (NodeRole::Worker, Action::Removed { previous, .. }) => {
            with_address(previous, AdminCommand::remove_member)
        }
        (NodeRole::Worker, Action::ReadinessChanged { current, .. }) => {
            if became_ready(current) {
                with_address(current, AdminCommand::add_member)
            } else {
                Derivation::NoOp(NoOpReason::BecameUnready)
            }
        }
    }
}

fn became_ready(current: &NodeSnapshot) -> bool {
    current.readiness == Some(true)
}

fn with_address(snapshot: &NodeSnapshot, command: fn(IpAddr) -> AdminCommand) -> Derivation {
    match snapshot.address {
        Some(address) => Derivation::Command(command(address)),
        None => {
            warn!(
                node = snapshot.name(),
                "Cannot derive membership command without a node address"
            );

            Derivation::NoOp(NoOpReason::MissingAddress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::classifier::tests::snapshot;
    use crate::node::NodePhase;

    fn readiness_changed(name: &str, address: Option<&str>, was: bool, is: bool) -> Action {
        let previous = snapshot(name, NodePhase::Pending, address, Some(was));
        let current = snapshot(name, NodePhase::Running, address, Some(is));

        Action::ReadinessChanged {
            role: current.role(),
            previous,
            current,
        }
    }

    #[test]
    fn test_worker_became_ready_adds_member() {
        let action = readiness_changed("yartu-dovecot-3", Some("10.0.0.9"), false, true);

        assert_eq!(
            Derivation::Command("doveadm director add 10.0.0.9".to_string().into()),
            derive(&action)
        );
    }

    #[test]
    fn test_worker_add_uses_current_address() {
        let action = Action::ReadinessChanged {
            role: NodeRole::Worker,
            previous: snapshot("yartu-dovecot-3", NodePhase::Pending, None, Some(false)),
            current: snapshot(
                "yartu-dovecot-3",
                NodePhase::Running,
                Some("10.0.0.10"),
                Some(true),
            ),
        };

        assert_eq!(
            Derivation::Command(AdminCommand::add_member("10.0.0.10".parse().unwrap())),
            derive(&action)
        );
    }

    #[test]
    fn test_worker_removal_is_compound_in_order() {
        let action = Action::Removed {
            role: NodeRole::Worker,
            previous: snapshot("yartu-dovecot-1", NodePhase::Running, Some("10.0.0.5"), Some(true)),
        };

        assert_eq!(
            Derivation::Command(
                "doveadm director update 10.0.0.5 0 && doveadm director flush 10.0.0.5 && doveadm director remove 10.0.0.5"
                    .to_string()
                    .into()
            ),
            derive(&action)
        );
    }

    #[test]
    fn test_director_removal_never_produces_a_command() {
        let phases = vec![
            NodePhase::Pending,
            NodePhase::Running,
            NodePhase::Other("Failed".into()),
        ];

        for phase in phases {
            for readiness in &[None, Some(false), Some(true)] {
                let action = Action::Removed {
                    role: NodeRole::Director,
                    previous: snapshot("yartu-director-2", phase.clone(), Some("10.0.1.2"), *readiness),
                };

                assert_eq!(
                    Derivation::NoOp(NoOpReason::DirectorRemoved),
                    derive(&action)
                );
            }
        }
    }

    #[test]
    fn test_director_became_ready_reloads() {
        let action = readiness_changed("yartu-director-1", Some("10.0.1.1"), false, true);

        assert_eq!(Derivation::Command(AdminCommand::reload()), derive(&action));
        assert_eq!("doveadm reload", AdminCommand::reload().as_str());
    }

    #[test]
    fn test_became_unready_is_a_noop() {
        for name in &["yartu-dovecot-1", "yartu-director-1"] {
            let action = readiness_changed(name, Some("10.0.0.1"), true, false);

            assert_eq!(Derivation::NoOp(NoOpReason::BecameUnready), derive(&action));
        }
    }

    #[test]
    fn test_worker_without_address_is_a_noop() {
        let action = Action::Removed {
            role: NodeRole::Worker,
            previous: snapshot("yartu-dovecot-1", NodePhase::Running, None, Some(true)),
        };

        assert_eq!(Derivation::NoOp(NoOpReason::MissingAddress), derive(&action));
    }
}

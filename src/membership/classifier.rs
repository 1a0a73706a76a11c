use super::{LifecycleEvent, LifecycleEventKind};
use crate::node::{NodePhase, NodeRole, NodeSnapshot};
use strum::Display;
use tracing::{info, trace};

/// A membership change worth telling the directors about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Removed {
        role: NodeRole,
        previous: NodeSnapshot,
    },
    ReadinessChanged {
        role: NodeRole,
        previous: NodeSnapshot,
        current: NodeSnapshot,
    },
}

impl Action {
    pub fn role(&self) -> NodeRole {
        match self {
            Action::Removed { role, .. } | Action::ReadinessChanged { role, .. } => *role,
        }
    }

    pub fn subject(&self) -> &NodeSnapshot {
        match self {
            Action::Removed { previous, .. } => previous,
            Action::ReadinessChanged { current, .. } => current,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IgnoreReason {
    MissingSnapshot,
    UnknownRole,
    DeletedWhilePending,
    ReadinessUnobservable,
    ReadinessUnchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Act(Action),
    Ignore(IgnoreReason),
}

impl Classification {
    pub fn action(self) -> Option<Action> {
        match self {
            Classification::Act(action) => Some(action),
            Classification::Ignore(_) => None,
        }
    }
}

pub fn classify(event: LifecycleEvent) -> Classification {
    let classification = classify_event(event);

    match &classification {
        Classification::Act(action) => info!(
            node = action.subject().name(),
            role = %action.role(),
            action = action_name(action),
            "Membership change detected"
        ),
        Classification::Ignore(reason) => trace!(%reason, "Ignoring lifecycle event"),
    }

    classification
}

fn classify_event(event: LifecycleEvent) -> Classification {
    let role = match event.subject() {
        Some(subject) => subject.role(),
        None => return Classification::Ignore(IgnoreReason::MissingSnapshot),
    };

    if role == NodeRole::Unknown {
        return Classification::Ignore(IgnoreReason::UnknownRole);
    }

    match (event.kind, event.previous, event.current) {
        (LifecycleEventKind::Deleted, Some(previous), _) => {
            if previous.phase == NodePhase::Pending {
                Classification::Ignore(IgnoreReason::DeletedWhilePending)
            } else {
                Classification::Act(Action::Removed { role, previous })
            }
        }
        (LifecycleEventKind::Updated, Some(previous), Some(current)) => {
            match (previous.readiness, current.readiness) {
                (Some(was_ready), Some(is_ready)) if was_ready != is_ready => {
                    Classification::Act(Action::ReadinessChanged {
                        role,
                        previous,
                        current,
                    })
                }
                (Some(_), Some(_)) => Classification::Ignore(IgnoreReason::ReadinessUnchanged),
                _ => Classification::Ignore(IgnoreReason::ReadinessUnobservable),
            }
        }
        _ => Classification::Ignore(IgnoreReason::MissingSnapshot),
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Removed { .. } => "removed",
        Action::ReadinessChanged { current, .. } if current.readiness == Some(true) => {
            "became_ready"
        }
        Action::ReadinessChanged { .. } => "became_unready",
    }
}

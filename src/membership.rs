mod classifier;
mod command;
mod controller;
pub mod fan_out;

use crate::node::NodeSnapshot;
use act_zero::{Actor, ActorResult};
use async_trait::async_trait;
use strum::Display;

pub use classifier::{classify, Action, Classification, IgnoreReason};
pub use command::{derive, AdminCommand, Derivation, NoOpReason};
pub use controller::MembershipController;
pub use fan_out::{FanOutOptions, FanOutReport, TargetResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum LifecycleEventKind {
    Deleted,
    Updated,
}

/// A pod deletion or update as observed by the watch, with the snapshots on
/// both sides of the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub kind: LifecycleEventKind,
    pub previous: Option<NodeSnapshot>,
    pub current: Option<NodeSnapshot>,
}

impl LifecycleEvent {
    pub fn deleted(previous: NodeSnapshot) -> Self {
        Self {
            kind: LifecycleEventKind::Deleted,
            previous: Some(previous),
            current: None,
        }
    }

    pub fn updated(previous: NodeSnapshot, current: NodeSnapshot) -> Self {
        Self {
            kind: LifecycleEventKind::Updated,
            previous: Some(previous),
            current: Some(current),
        }
    }

    /// The most recent snapshot carried by the event.
    pub fn subject(&self) -> Option<&NodeSnapshot> {
        self.current.as_ref().or_else(|| self.previous.as_ref())
    }
}

#[async_trait]
pub trait LifecycleEventObserver: Actor {
    async fn observe_lifecycle_event(
        &mut self,
        event: LifecycleEvent,
    ) -> ActorResult<Option<FanOutReport>>;
}

use super::fan_out::{self, FanOutOptions, FanOutReport};
use super::{classify, derive, Derivation, LifecycleEvent, LifecycleEventObserver};
use crate::actor;
use crate::director::{self, DirectorDiscoveryProvider};
use crate::remote_exec::RemoteExec;
use act_zero::{Actor, ActorError, ActorResult, Addr, Produces};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Turns lifecycle events into director membership commands.
///
/// Events are handled one at a time in the order they arrive; nothing is kept
/// between two events, the director set is listed anew for every command.
pub struct MembershipController {
    director_discovery: Addr<dyn DirectorDiscoveryProvider>,
    remote_exec: Arc<dyn RemoteExec>,
    fan_out_options: FanOutOptions,
}

impl MembershipController {
    pub fn new(
        director_discovery: Addr<dyn DirectorDiscoveryProvider>,
        remote_exec: Arc<dyn RemoteExec>,
        fan_out_options: FanOutOptions,
    ) -> Self {
        Self {
            director_discovery,
            remote_exec,
            fan_out_options,
        }
    }

    async fn reconcile(&mut self, event: LifecycleEvent) -> Option<FanOutReport> {
        let action = classify(event).action()?;

        let command = match derive(&action) {
            Derivation::Command(command) => command,
            Derivation::NoOp(reason) => {
                info!(node = action.subject().name(), %reason, "No command required");
                return None;
            }
        };

        let directors = match director::current_directors(self.director_discovery.clone()).await {
            Ok(directors) => directors,
            Err(e) => {
                error!(error = %e, %command, "Dropping membership command");
                return None;
            }
        };

        if directors.is_empty() {
            info!(%command, "No running directors to execute command on");
        }

        Some(
            fan_out::execute(
                command,
                directors,
                self.remote_exec.as_ref(),
                self.fan_out_options,
            )
            .await,
        )
    }
}

impl fmt::Display for MembershipController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MembershipController")
    }
}

impl fmt::Debug for MembershipController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[async_trait]
impl Actor for MembershipController {
    #[tracing::instrument(name = "MembershipController::started", skip(self, _addr))]
    async fn started(&mut self, _addr: Addr<Self>) -> ActorResult<()>
    where
        Self: Sized,
    {
        info!(remote_exec = ?self.remote_exec, "Started");

        Produces::ok(())
    }

    async fn error(&mut self, error: ActorError) -> bool {
        actor::handle_error(error)
    }
}

#[async_trait]
impl LifecycleEventObserver for MembershipController {
    #[tracing::instrument(
        name = "MembershipController::observe_lifecycle_event",
        skip(self, event),
        fields(
            kind = %event.kind,
            node = event.subject().map(|s| s.name()).unwrap_or_default()
        )
    )]
    async fn observe_lifecycle_event(
        &mut self,
        event: LifecycleEvent,
    ) -> ActorResult<Option<FanOutReport>> {
        Produces::ok(self.reconcile(event).await)
    }
}

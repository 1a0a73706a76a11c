mod tracker;

use crate::membership::LifecycleEventObserver;
use act_zero::{call, Addr};
use anyhow::anyhow;
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use std::fmt::Display;
use tracing::{info, warn};

pub use tracker::PodTracker;

/// Opens the pod watch, across all namespaces unless one is given.
///
/// The stream resumes from the last seen resource version after errors and
/// backs off exponentially while the API server is unreachable.
pub fn pod_events(
    client: Client,
    namespace: Option<&str>,
) -> impl Stream<Item = Result<watcher::Event<Pod>, watcher::Error>> + Send {
    let pods: Api<Pod> = match namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    };

    watcher(pods, watcher::Config::default()).default_backoff()
}

/// Feeds every pod event through the tracker and hands the resulting lifecycle
/// events to the observer, waiting for each one to be processed before the
/// next is taken from the stream.
///
/// Only returns once the stream has ended, which is always an error.
#[tracing::instrument(name = "watch::run", skip(events, tracker, observer))]
pub async fn run<S, E>(
    events: S,
    mut tracker: PodTracker,
    observer: Addr<dyn LifecycleEventObserver>,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<watcher::Event<Pod>, E>>,
    E: Display,
{
    info!("Watching pods");

    futures::pin_mut!(events);

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Pod watch failed, resubscribing");
                continue;
            }
        };

        for lifecycle_event in tracker.track(event) {
            let result = call!(observer.observe_lifecycle_event(lifecycle_event)).await;

            if let Err(e) = result {
                warn!("Failed to process lifecycle event {:?}", e);
            }
        }
    }

    Err(anyhow!("Pod watch stream ended"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::{DirectorDiscoveryProvider, MockDirectorDiscovery};
    use crate::membership::fan_out::tests::RecordingExec;
    use crate::membership::{FanOutOptions, MembershipController};
    use crate::node::RoleMatcher;
    use act_zero::runtimes::tokio::spawn_actor;
    use act_zero::upcast;
    use serde_json::json;
    use std::sync::Arc;

    fn pod(name: &str, phase: &str, ip: &str, ready: bool) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name, "namespace": "default" },
            "status": {
                "phase": phase,
                "podIP": ip,
                "containerStatuses": [{
                    "name": "main",
                    "ready": ready,
                    "restartCount": 0,
                    "image": "dovecot",
                    "imageID": ""
                }]
            }
        }))
        .unwrap()
    }

    fn observer(exec: Arc<RecordingExec>) -> Addr<dyn LifecycleEventObserver> {
        let roles = RoleMatcher::new("yartu-dovecot", "yartu-director");
        let discovery: Addr<dyn DirectorDiscoveryProvider> =
            upcast!(spawn_actor(MockDirectorDiscovery::new(
                vec!["yartu-director-1".into(), "yartu-director-2".into()],
                "default".into(),
                roles,
            )));

        upcast!(spawn_actor(MembershipController::new(
            discovery,
            exec,
            FanOutOptions::default(),
        )))
    }

    fn tracker() -> PodTracker {
        PodTracker::new(RoleMatcher::new("yartu-dovecot", "yartu-director"))
    }

    #[tokio::test]
    async fn test_worker_becoming_ready_reaches_every_director() {
        let exec = Arc::new(RecordingExec::default());
        let events = futures::stream::iter(vec![
            Ok::<_, String>(watcher::Event::Apply(pod(
                "yartu-dovecot-3",
                "Pending",
                "10.0.0.9",
                false,
            ))),
            Ok(watcher::Event::Apply(pod(
                "yartu-dovecot-3",
                "Running",
                "10.0.0.9",
                true,
            ))),
        ]);

        let result = run(events, tracker(), observer(exec.clone())).await;

        assert!(result.is_err());

        let mut calls = exec.calls();
        calls.sort();
        assert_eq!(
            vec![
                (
                    "yartu-director-1".to_string(),
                    "doveadm director add 10.0.0.9".to_string()
                ),
                (
                    "yartu-director-2".to_string(),
                    "doveadm director add 10.0.0.9".to_string()
                ),
            ],
            calls
        );
    }

    #[tokio::test]
    async fn test_watch_errors_do_not_stop_the_loop() {
        let exec = Arc::new(RecordingExec::default());
        let events = futures::stream::iter(vec![
            Ok(watcher::Event::Apply(pod(
                "yartu-dovecot-1",
                "Running",
                "10.0.0.5",
                true,
            ))),
            Err("connection reset".to_string()),
            Ok(watcher::Event::Delete(pod(
                "yartu-dovecot-1",
                "Running",
                "10.0.0.5",
                false,
            ))),
        ]);

        let result = run(events, tracker(), observer(exec.clone())).await;

        assert!(result.is_err());
        assert_eq!(2, exec.calls().len());
        assert!(exec.calls().iter().all(|(_, command)| command
            == "doveadm director update 10.0.0.5 0 && doveadm director flush 10.0.0.5 && doveadm director remove 10.0.0.5"));
    }

    #[tokio::test]
    async fn test_commands_follow_event_order() {
        let exec = Arc::new(RecordingExec::default());
        let events = futures::stream::iter(vec![
            Ok::<_, String>(watcher::Event::Apply(pod(
                "yartu-dovecot-1",
                "Running",
                "10.0.0.5",
                false,
            ))),
            Ok(watcher::Event::Apply(pod(
                "yartu-dovecot-1",
                "Running",
                "10.0.0.5",
                true,
            ))),
            Ok(watcher::Event::Delete(pod(
                "yartu-dovecot-1",
                "Running",
                "10.0.0.5",
                true,
            ))),
        ]);

        run(events, tracker(), observer(exec.clone()))
            .await
            .unwrap_err();

        let commands: Vec<String> = exec.calls().into_iter().map(|(_, c)| c).collect();
        assert_eq!(4, commands.len());
        assert!(commands[..2]
            .iter()
            .all(|c| c == "doveadm director add 10.0.0.5"));
        assert!(commands[2..]
            .iter()
            .all(|c| c.starts_with("doveadm director update 10.0.0.5 0")));
    }
}

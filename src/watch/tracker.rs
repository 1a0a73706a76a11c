use crate::membership::LifecycleEvent;
use crate::node::{NodeSnapshot, RoleMatcher};
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Remembers the last seen snapshot of every pod, so that watch events that
/// only carry the new state can be turned into before/after transitions.
#[derive(Debug)]
pub struct PodTracker {
    roles: RoleMatcher,
    pods: HashMap<String, NodeSnapshot>,
    relisted: Option<HashSet<String>>,
}

impl PodTracker {
    pub fn new(roles: RoleMatcher) -> Self {
        Self {
            roles,
            pods: HashMap::new(),
            relisted: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    pub fn track(&mut self, event: watcher::Event<Pod>) -> Vec<LifecycleEvent> {
        match event {
            watcher::Event::Apply(pod) => self.apply(&pod).into_iter().collect(),
            watcher::Event::Delete(pod) => vec![self.delete(&pod)],
            watcher::Event::Init => {
                debug!(known_pods = self.pods.len(), "Pod relist started");
                self.relisted = Some(HashSet::new());
                vec![]
            }
            watcher::Event::InitApply(pod) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(key(&pod));
                }

                self.apply(&pod).into_iter().collect()
            }
            watcher::Event::InitDone => self.finish_relist(),
        }
    }

    fn apply(&mut self, pod: &Pod) -> Option<LifecycleEvent> {
        let current = NodeSnapshot::from_pod(pod, &self.roles);

        self.pods
            .insert(key(pod), current.clone())
            .filter(|previous| previous != &current)
            .map(|previous| LifecycleEvent::updated(previous, current))
    }

    fn delete(&mut self, pod: &Pod) -> LifecycleEvent {
        let mut previous = NodeSnapshot::from_pod(pod, &self.roles);

        if let Some(last_known) = self.pods.remove(&key(pod)) {
            if previous.address.is_none() {
                previous.address = last_known.address;
            }
        }

        LifecycleEvent::deleted(previous)
    }

    /// Pods that disappeared while the watch was down are reported as deleted.
    fn finish_relist(&mut self) -> Vec<LifecycleEvent> {
        let relisted = match self.relisted.take() {
            Some(relisted) => relisted,
            None => return vec![],
        };

        let vanished: Vec<String> = self
            .pods
            .keys()
            .filter(|key| !relisted.contains(*key))
            .cloned()
            .collect();

        debug!(
            known_pods = self.pods.len(),
            vanished = vanished.len(),
            "Pod relist finished"
        );

        vanished
            .into_iter()
            .filter_map(|key| self.pods.remove(&key))
            .map(LifecycleEvent::deleted)
            .collect()
    }
}

fn key(pod: &Pod) -> String {
    format!(
        "{}/{}",
        pod.metadata.namespace.as_deref().unwrap_or_default(),
        pod.metadata.name.as_deref().unwrap_or_default()
    )
}

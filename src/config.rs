use crate::AppConfig;
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub worker_prefix: String,
    pub director_prefix: String,
    pub watch: Watch,
    pub director_discovery: DirectorDiscovery,
    pub remote_exec: RemoteExec,
    pub fan_out: FanOut,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_prefix: "yartu-dovecot".into(),
            director_prefix: "yartu-director".into(),
            watch: Default::default(),
            director_discovery: Default::default(),
            remote_exec: Default::default(),
            fan_out: Default::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Watch {
    /// Restricts the pod watch to one namespace, all namespaces when absent.
    pub namespace: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirectorDiscovery {
    Mock {
        directors: Vec<String>,
        #[serde(default = "default_namespace")]
        namespace: String,
    },
    Kubernetes {
        #[serde(default = "default_namespace")]
        namespace: String,
        #[serde(default)]
        label_selector: Option<String>,
    },
}

impl Default for DirectorDiscovery {
    fn default() -> Self {
        DirectorDiscovery::Kubernetes {
            namespace: default_namespace(),
            label_selector: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteExec {
    DryRun,
    Kubernetes {
        #[serde(default = "default_shell")]
        shell: String,
        #[serde(default)]
        container: Option<String>,
    },
}

impl Default for RemoteExec {
    fn default() -> Self {
        RemoteExec::Kubernetes {
            shell: default_shell(),
            container: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FanOut {
    #[serde(with = "humantime_serde")]
    pub exec_timeout: Duration,
    pub concurrency: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self {
            exec_timeout: Duration::from_secs(30),
            concurrency: 1,
        }
    }
}

impl Config {
    pub fn director_label_selector(&self) -> String {
        match &self.director_discovery {
            DirectorDiscovery::Kubernetes {
                label_selector: Some(selector),
                ..
            } => selector.clone(),
            _ => format!("app={}", self.director_prefix),
        }
    }
}

fn default_namespace() -> String {
    "default".into()
}

fn default_shell() -> String {
    "sh".into()
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    use tracing::info;

    let config_path = match get_config_path() {
        Some(path) => path,
        None if !Path::new(DEFAULT_CONFIG_PATH).exists() => {
            info!(
                "Missing {}, falling back to built-in defaults",
                DEFAULT_CONFIG_PATH
            );

            return Ok(Arc::new(Config::default()));
        }
        None => DEFAULT_CONFIG_PATH.to_string(),
    };

    let file = File::open(&config_path)
        .with_context(|| format!("Failed to open config file {}", &config_path))?;

    let config = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config file {}", &config_path))?;

    Ok(Arc::new(config))
}

fn get_config_path() -> Option<String> {
    use std::env;
    use tracing::info;

    env::var("APP_CONFIG")
        .map_err(|e| {
            info!(
                error = format!("{:?}", e).as_str(),
                "Missing or invalid APP_CONFIG env var, fallback to {}", DEFAULT_CONFIG_PATH
            );
        })
        .ok()
}

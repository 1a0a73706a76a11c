use act_zero::runtimes::tokio::spawn_actor;
use act_zero::upcast;
use director_sync::config::load_config;
use director_sync::membership::{FanOutOptions, MembershipController};
use director_sync::node::RoleMatcher;
use director_sync::watch::{self, PodTracker};
use director_sync::{director, remote_exec};
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(ErrorLayer::default());

    set_global_default(subscriber)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let config = load_config()?;

    info!(
        worker_prefix = config.worker_prefix.as_str(),
        director_prefix = config.director_prefix.as_str(),
        "Starting director sync"
    );

    let client = kube::Client::try_default().await?;

    let director_discovery = director::build_from_config(config.clone(), Some(client.clone()))?;
    let remote_exec = remote_exec::build_from_config(config.clone(), Some(client.clone()))?;

    let membership_controller = spawn_actor(MembershipController::new(
        director_discovery,
        remote_exec,
        FanOutOptions::from(&config.fan_out),
    ));

    let tracker = PodTracker::new(RoleMatcher::new(
        &config.worker_prefix,
        &config.director_prefix,
    ));
    let events = watch::pod_events(client, config.watch.namespace.as_deref());

    tokio::select! {
        result = watch::run(events, tracker, upcast!(membership_controller)) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

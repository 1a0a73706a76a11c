use std::sync::Arc;

pub mod actor;
pub mod config;
pub mod director;
pub mod membership;
pub mod node;
pub mod remote_exec;
pub mod watch;

pub type AppConfig = Arc<config::Config>;

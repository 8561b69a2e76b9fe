//! CLI module for the gateway control plane
//!
//! Operator front-end over the state reader and writer:
//! - `key`: check, create and delete API keys
//! - `account`: check, pause and resume accounts
//! - `logs`: publish and tail access log records

pub mod account;
pub mod key;
pub mod logs;

use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::LogBroker;
use crate::infrastructure::access_log::{AccessLogConfig, BrokerFactory, BrokerType};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::register_default_metrics;
use crate::infrastructure::state::{StateClient, StoreConfig, StoreType};

/// Gateway control plane - API key validity and account pause state
#[derive(Parser)]
#[command(name = "gateway-control")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage API keys
    #[command(subcommand)]
    Key(key::KeyCommand),

    /// Manage account suspension
    #[command(subcommand)]
    Account(account::AccountCommand),

    /// Publish and tail access logs
    Logs(logs::LogsArgs),
}

/// Store connection overrides, applied on top of the loaded configuration
#[derive(Args, Debug, Default, Clone)]
pub struct StoreArgs {
    /// Comma separated etcd endpoints (host:port)
    #[arg(long, global = true, value_delimiter = ',')]
    pub endpoints: Vec<String>,

    /// etcd username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// etcd password
    #[arg(long, global = true, env = "GATEWAY_CONTROL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl StoreArgs {
    pub fn apply(self, config: &mut StoreConfig) {
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints;
        }

        if let Some(username) = self.username {
            config.username = Some(username);
        }

        if let Some(password) = self.password {
            config.password = Some(password);
        }
    }
}

/// Opens the state session for one invocation
///
/// Process-local backends are refused: their state would vanish when the
/// command exits.
pub async fn connect_state(config: &StoreConfig) -> anyhow::Result<StateClient> {
    if config.backend == StoreType::InMemory {
        anyhow::bail!("The in_memory store keeps no state between invocations, configure etcd");
    }

    StateClient::connect(config)
        .await
        .context("connect state store")
}

/// Creates the access log broker for one invocation
pub fn connect_broker(config: &AccessLogConfig) -> anyhow::Result<Arc<dyn LogBroker>> {
    if config.backend == BrokerType::InMemory {
        anyhow::bail!("The in_memory broker keeps no records between invocations, configure kafka");
    }

    BrokerFactory::new()
        .create(config)
        .context("create access log broker")
}

/// Loads configuration, initializes logging and dispatches the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);
    register_default_metrics();

    cli.store.apply(&mut config.store);

    let mut out = io::stdout();

    match cli.command {
        Command::Key(command) => {
            let client = connect_state(&config.store).await?;
            let result = key::run(&client, command, &mut out).await;
            client.stop().await;
            result
        }
        Command::Account(command) => {
            let client = connect_state(&config.store).await?;
            let result = account::run(&client, command, &mut out).await;
            client.stop().await;
            result
        }
        Command::Logs(args) => {
            args.apply(&mut config.access_log);

            let broker = connect_broker(&config.access_log)?;
            let result =
                logs::run(broker.clone(), &config.access_log, args.command, &mut out).await;
            broker.close().await;
            result
        }
    }
}

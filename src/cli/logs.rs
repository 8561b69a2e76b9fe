//! Access log commands - publish and tail audit records

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};
use tokio::sync::mpsc;

use crate::domain::{AccessLog, LogBroker};
use crate::infrastructure::access_log::AccessLogConfig;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Comma separated Kafka seed brokers (host:port)
    #[arg(long, value_delimiter = ',')]
    pub brokers: Vec<String>,

    /// Access log topic
    #[arg(long)]
    pub topic: Option<String>,

    #[command(subcommand)]
    pub command: LogsCommand,
}

impl LogsArgs {
    pub fn apply(&self, config: &mut AccessLogConfig) {
        if !self.brokers.is_empty() {
            config.brokers = self.brokers.clone();
        }

        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LogsCommand {
    /// Publish one access log record
    Send {
        /// Request path
        #[arg(long)]
        path: String,

        /// Response status code
        #[arg(long)]
        status: u16,

        /// API key the request carried
        #[arg(long)]
        key: Option<String>,
    },

    /// Print access log records as JSON lines until interrupted
    Tail {
        /// Consumer group to join, the configured group when omitted
        #[arg(long)]
        group: Option<String>,

        /// Exit after this many records
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub async fn run<W: Write>(
    broker: Arc<dyn LogBroker>,
    config: &AccessLogConfig,
    command: LogsCommand,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        LogsCommand::Send { path, status, key } => {
            let producer = config.producer(broker)?;

            let mut log = AccessLog::new(path, status, Utc::now());
            if let Some(key) = key {
                log = log.with_key(key);
            }

            producer
                .produce_log(&log)
                .await
                .with_context(|| format!("publish to {}", producer.topic()))?;
            producer.stop();
        }
        LogsCommand::Tail { group, limit } => {
            let mut config = config.clone();
            if let Some(group) = group {
                config.group = group;
            }

            let consumer = config.consumer(broker)?;
            let (tx, mut rx) = mpsc::unbounded_channel();

            consumer
                .start(move |log| {
                    let _ = tx.send(log);
                })
                .await
                .with_context(|| format!("subscribe to {}", config.topic))?;

            let mut printed = 0;
            while limit.is_none_or(|limit| printed < limit) {
                let log = tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    log = rx.recv() => match log {
                        Some(log) => log,
                        None => break,
                    },
                };

                writeln!(out, "{}", serde_json::to_string(&log)?)?;
                printed += 1;
            }

            consumer.stop().await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::access_log::InMemoryBroker;

    fn config() -> AccessLogConfig {
        AccessLogConfig::in_memory().with_topic("gateway.access.test")
    }

    #[tokio::test]
    async fn test_send_then_tail() {
        let broker: Arc<dyn LogBroker> = Arc::new(InMemoryBroker::new());

        for (path, status) in [("/foo", 200), ("/bar", 429)] {
            run(
                broker.clone(),
                &config(),
                LogsCommand::Send {
                    path: path.to_string(),
                    status,
                    key: Some("K1".to_string()),
                },
                &mut Vec::new(),
            )
            .await
            .unwrap();
        }

        let mut out = Vec::new();
        run(
            broker,
            &config(),
            LogsCommand::Tail {
                group: None,
                limit: Some(2),
            },
            &mut out,
        )
        .await
        .unwrap();

        let logs: Vec<AccessLog> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].path, "/foo");
        assert_eq!(logs[1].status, 429);
        assert_eq!(logs[1].key.as_deref(), Some("K1"));
    }

    #[tokio::test]
    async fn test_tail_stops_when_broker_closes() {
        let broker = Arc::new(InMemoryBroker::new());
        let closer = broker.clone();

        let tail = tokio::spawn(async move {
            let mut out = Vec::new();
            run(
                broker,
                &config(),
                LogsCommand::Tail {
                    group: Some("closing".to_string()),
                    limit: None,
                },
                &mut out,
            )
            .await
            .map(|_| out)
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        closer.close().await;

        let out = tokio::time::timeout(std::time::Duration::from_secs(5), tail)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_args_override_config() {
        let args = LogsArgs {
            brokers: vec!["kafka-0:9092".to_string()],
            topic: Some("gateway.access.prod".to_string()),
            command: LogsCommand::Tail {
                group: None,
                limit: None,
            },
        };
        let mut config = AccessLogConfig::default();

        args.apply(&mut config);

        assert_eq!(config.brokers, vec!["kafka-0:9092".to_string()]);
        assert_eq!(config.topic, "gateway.access.prod");
    }
}

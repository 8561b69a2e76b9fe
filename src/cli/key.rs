//! Key commands - check, create and delete API keys

use std::io::Write;

use anyhow::Context;
use clap::Subcommand;
use uuid::Uuid;

use crate::infrastructure::state::{StateClient, StateReader, StateWriter};

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Print the account and key id an API key belongs to
    Check {
        /// API key to look up
        key: String,
    },

    /// Register an API key for an account, replacing any existing record
    Create {
        /// Owning account
        #[arg(long)]
        account: String,

        /// Identifier of the issued key
        #[arg(long)]
        key_id: String,

        /// API key value, a random UUID is generated when omitted
        #[arg(long)]
        key: Option<String>,
    },

    /// Revoke an API key
    Delete {
        /// API key to revoke
        key: String,
    },
}

pub async fn run<W: Write>(
    client: &StateClient,
    command: KeyCommand,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        KeyCommand::Check { key } => {
            let reader = StateReader::new(client.clone());

            match reader
                .check_key(&key)
                .await
                .with_context(|| format!("check key {}", key))?
            {
                Some(record) => writeln!(out, "{}\t{}", record.account, record.key_id)?,
                None => writeln!(out, "Key {} is not registered", key)?,
            }
        }
        KeyCommand::Create {
            account,
            key_id,
            key,
        } => {
            let key = key.unwrap_or_else(|| Uuid::new_v4().to_string());

            StateWriter::new(client.clone())
                .create_key(&account, &key_id, &key)
                .await
                .with_context(|| format!("create key {}", key))?;

            writeln!(out, "{}", key)?;
        }
        KeyCommand::Delete { key } => {
            StateWriter::new(client.clone())
                .delete_key(&key)
                .await
                .with_context(|| format!("delete key {}", key))?;
        }
    }

    Ok(())
}

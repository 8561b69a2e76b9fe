//! Account commands - check, pause and resume accounts

use std::io::Write;

use anyhow::Context;
use clap::Subcommand;

use crate::infrastructure::state::{StateClient, StateReader, StateWriter};

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Print whether an account is paused
    Check { account: String },

    /// Suspend an account
    Pause { account: String },

    /// Lift an account suspension
    Resume { account: String },
}

pub async fn run<W: Write>(
    client: &StateClient,
    command: AccountCommand,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        AccountCommand::Check { account } => {
            let paused = StateReader::new(client.clone())
                .check_account_paused(&account)
                .await
                .with_context(|| format!("check account {}", account))?;

            writeln!(out, "{}", if paused { "paused" } else { "active" })?;
        }
        AccountCommand::Pause { account } => {
            StateWriter::new(client.clone())
                .pause_account(&account)
                .await
                .with_context(|| format!("pause account {}", account))?;
        }
        AccountCommand::Resume { account } => {
            StateWriter::new(client.clone())
                .resume_account(&account)
                .await
                .with_context(|| format!("resume account {}", account))?;
        }
    }

    Ok(())
}

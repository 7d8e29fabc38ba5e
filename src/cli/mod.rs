pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medadmin")]
#[command(about = "Admin utilities for the Medicine Delivery API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Hash an admin password for ADMIN_PASSWORD_HASH (reads stdin when no password is given)")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: Option<String>,
        #[arg(long, default_value_t = crate::auth::password::DEFAULT_ROUNDS, help = "PBKDF2 rounds")]
        rounds: u32,
    },

    #[command(about = "Summarize the records in a data file")]
    Inspect {
        #[arg(help = "Data file (defaults to DATA_FILE or deliveries.json)")]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::HashPassword { password, rounds } => commands::hash::handle(password, rounds, output_format),
        Commands::Inspect { file } => commands::inspect::handle(file, output_format).await,
    }
}

use anyhow::Context;
use serde_json::json;
use std::io::BufRead;

use crate::auth::password::hash_password_with_rounds;
use crate::cli::OutputFormat;

pub fn handle(password: Option<String>, rounds: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let hash = hash_password_with_rounds(&password, rounds)?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "admin_password_hash": hash })),
        OutputFormat::Text => println!("{}", hash),
    }
    Ok(())
}

//! Payload command handlers
//!
//! Encodes request files into the token carried in `KERNELBOT_PAYLOAD`, and
//! decodes tokens back for inspection.

use anyhow::{Context, Result};
use clap::Subcommand;
use kernelbot_core::codec;
use serde_json::Value;
use std::path::PathBuf;

/// Payload subcommands
#[derive(Subcommand)]
pub enum PayloadCommands {
    /// Encode a JSON file into a payload token
    Encode {
        file: PathBuf,
    },
    /// Decode a payload token and print its JSON
    Decode {
        token: String,
    },
}

pub fn handle_payload_command(command: PayloadCommands) -> Result<()> {
    match command {
        PayloadCommands::Encode { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", encode_json(&content)?);
        }
        PayloadCommands::Decode { token } => {
            println!("{}", decode_json(&token)?);
        }
    }
    Ok(())
}

fn encode_json(content: &str) -> Result<String> {
    let value: Value = serde_json::from_str(content).context("Input is not valid JSON")?;
    Ok(codec::encode(&value)?)
}

fn decode_json(token: &str) -> Result<String> {
    let value: Value = codec::decode(token).context("Invalid payload token")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

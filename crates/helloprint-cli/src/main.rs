use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use helloprint_core::{quic, tls};

mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "helloprint")]
#[command(about = "Fingerprint captured TLS and QUIC ClientHello messages")]
struct Cli {
    /// Output format: "text" (human-readable) or "json" (NDJSON, one object per line)
    #[arg(short, long, default_value = "text", global = true)]
    output: String,

    /// Print raw field listings in addition to the fingerprint IDs
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a captured TLS ClientHello record
    Tls {
        /// Input file ("-" or omitted reads stdin)
        file: Option<PathBuf>,

        /// Input as a hex string instead of a file
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,

        /// Input is a bare handshake message without the record layer
        #[arg(long, default_value_t = false)]
        body: bool,
    },

    /// Parse the decrypted payload of a QUIC Initial packet
    Quic {
        /// Input file ("-" or omitted reads stdin)
        file: Option<PathBuf>,

        /// Input as a hex string instead of a file
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,

        /// List the decoded frames before parsing the CRYPTO stream
        #[arg(long, default_value_t = false)]
        frames: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let format = OutputFormat::parse(&cli.output)?;

    match cli.command {
        Commands::Tls { file, hex, body } => {
            let data = read_input(file.as_deref(), hex.as_deref())?;
            let hello = if body {
                tls::parse_body(&data).context("failed to parse ClientHello handshake")?
            } else {
                tls::parse_record(&data).context("failed to parse ClientHello record")?
            };
            output::print_client_hello(&hello, "tls", format, cli.verbose);
        }

        Commands::Quic { file, hex, frames } => {
            let data = read_input(file.as_deref(), hex.as_deref())?;
            let frame_list =
                quic::read_frames(&data).context("failed to decode QUIC Initial frames")?;
            if frames {
                output::print_frames(&frame_list);
            }
            let stream = quic::reassemble_crypto(&frame_list)
                .context("failed to reassemble the CRYPTO stream")?;
            debug!(
                "decoded {} frames, reassembled {} CRYPTO bytes",
                frame_list.len(),
                stream.len()
            );
            let hello = tls::parse_body(&stream)
                .context("failed to parse the reassembled ClientHello")?;
            output::print_client_hello(&hello, "quic", format, cli.verbose);
        }
    }

    Ok(())
}

/// Read the message bytes from a hex string, a file, or stdin.
fn read_input(file: Option<&Path>, hex_input: Option<&str>) -> Result<Vec<u8>> {
    if let Some(hex_input) = hex_input {
        let compact: String = hex_input.split_whitespace().collect();
        return hex::decode(&compact).context("invalid hex input");
    }

    let data = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    if data.is_empty() {
        bail!("empty input");
    }
    Ok(data)
}

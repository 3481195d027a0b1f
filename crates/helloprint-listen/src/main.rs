use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use helloprint_core::tls::{self, ClientHello};

#[derive(Parser)]
#[command(name = "helloprint-listen")]
#[command(about = "Capture listener — fingerprints the first TLS record of each connection")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8443)]
    port: u16,

    /// Output format: "text" (human-readable) or "json" (NDJSON, one object per line)
    #[arg(short, long, default_value = "text")]
    output: String,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    peer: String,
    #[serde(flatten)]
    hello: &'a ClientHello,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let json = match cli.output.as_str() {
        "text" => false,
        "json" => true,
        other => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", other),
    };

    let addr: SocketAddr = ([0, 0, 0, 0], cli.port).into();
    let listener = TcpListener::bind(addr).await?;

    info!("helloprint listening on {}", addr);
    info!("Test with: curl -k https://localhost:{}", cli.port);
    info!("Press Ctrl+C to stop\n");

    loop {
        let (mut stream, peer) = listener.accept().await?;

        tokio::spawn(async move {
            // Read TLS record header (5 bytes): content_type(1) + version(2) + length(2)
            let mut header = [0u8; 5];
            if let Err(e) = stream.read_exact(&mut header).await {
                warn!("[{}] failed to read TLS header: {}", peer, e);
                return;
            }

            if header[0] != 0x16 {
                warn!("[{}] not a TLS handshake (got 0x{:02x})", peer, header[0]);
                return;
            }

            let record_len = u16::from_be_bytes([header[3], header[4]]) as usize;
            if record_len > 16384 {
                warn!("[{}] record too large: {} bytes", peer, record_len);
                return;
            }

            // Read the full record body
            let mut body = vec![0u8; record_len];
            if let Err(e) = stream.read_exact(&mut body).await {
                warn!("[{}] failed to read record body: {}", peer, e);
                return;
            }

            // Reassemble: header + body for the parser
            let mut full = Vec::with_capacity(5 + record_len);
            full.extend_from_slice(&header);
            full.extend_from_slice(&body);

            match tls::parse_record(&full) {
                Ok(hello) => {
                    if json {
                        print_json(&hello, peer.to_string());
                    } else {
                        print_text(&hello, peer);
                    }
                }
                Err(e) => {
                    error!("[{}] parse error: {}", peer, e);
                }
            }

            // Connection drops here — the client sees a TLS error, that's expected
        });
    }
}

fn print_text(hello: &ClientHello, peer: SocketAddr) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Client:     {}", peer);
    println!(
        "  SNI:        {}",
        if hello.server_name.is_empty() {
            "(none)"
        } else {
            hello.server_name.as_str()
        }
    );
    println!("  TLS ver:    0x{:04x}", hello.tls_handshake_version);
    if !hello.supported_versions.is_empty() {
        let vers: Vec<String> = hello
            .supported_versions
            .iter()
            .map(|v| format!("0x{:04x}", v))
            .collect();
        println!("  Sup. vers:  {}", vers.join(", "));
    }
    println!("  Ciphers:    {} suites", hello.cipher_suites.len());
    println!("  Extensions: {} types", hello.extensions.len());
    if !hello.alpn.is_empty() {
        println!("  ALPN:       {}", hello.alpn.join(", "));
    }
    println!("  ──────────────────────────────────────────────────");
    println!("  ID:         {}", hello.hex_id);
    println!("  Norm ID:    {}", hello.norm_hex_id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn print_json(hello: &ClientHello, peer: String) {
    let record = JsonRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        peer,
        hello,
    };
    println!("{}", serde_json::to_string(&record).unwrap());
}

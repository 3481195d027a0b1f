use serde::Serialize;

use helloprint_core::quic::Frame;
use helloprint_core::tls::ClientHello;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    source: &'a str,
    #[serde(flatten)]
    hello: &'a ClientHello,
}

pub fn print_client_hello(
    hello: &ClientHello,
    source: &str,
    format: OutputFormat,
    verbose: bool,
) {
    match format {
        OutputFormat::Text => print_text(hello, source, verbose),
        OutputFormat::Json => print_json(hello, source),
    }
}

fn print_text(hello: &ClientHello, source: &str, verbose: bool) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Source:     {}", source);
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
    if let Some(params) = &hello.quic_transport_parameters {
        println!("  QUIC TPs:   {} parameters", params.len());
    }
    if verbose {
        println!(
            "  Ext IDs:    {}",
            hello
                .extensions
                .iter()
                .map(|e| format!("{e}"))
                .collect::<Vec<_>>()
                .join("-")
        );
        println!(
            "  Groups:     {}",
            hello
                .named_groups
                .iter()
                .map(|g| format!("{g}"))
                .collect::<Vec<_>>()
                .join("-")
        );
    }
    println!("  ──────────────────────────────────────────────────");
    println!("  ID:         {}", hello.hex_id);
    println!("  Norm ID:    {}", hello.norm_hex_id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn print_json(hello: &ClientHello, source: &str) {
    let record = JsonRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        source,
        hello,
    };
    println!("{}", serde_json::to_string(&record).unwrap());
}

/// One line per decoded frame, before the CRYPTO stream is reassembled.
pub fn print_frames(frames: &[Frame<'_>]) {
    for (i, frame) in frames.iter().enumerate() {
        match frame {
            Frame::Padding { length } => {
                println!("frame #{i:<3} PADDING length={length}");
            }
            Frame::Ping => println!("frame #{i:<3} PING"),
            Frame::Ack { ecn } => {
                println!("frame #{i:<3} ACK{}", if *ecn { " (ECN)" } else { "" });
            }
            Frame::Crypto { offset, length, .. } => {
                println!("frame #{i:<3} CRYPTO offset={offset} length={length}");
            }
            Frame::ConnectionClose { error_code, .. } => {
                println!(
                    "frame #{i:<3} CONNECTION_CLOSE (0x{:02x}) error={error_code}",
                    frame.frame_type()
                );
            }
        }
    }
}

//! TLS ClientHello record and parser.
//!
//! Two entry points cover the two capture paths:
//!
//! - [`parse_record`] for a full TLS record as read off a TCP stream
//!   (5-byte record header followed by the handshake payload).
//! - [`parse_body`] for a bare handshake message, the form carried in a
//!   reassembled QUIC CRYPTO stream where no record layer exists.
//!
//! The returned [`ClientHello`] is owned and never mutated after
//! construction, so it can be shared across threads freely.

mod extensions;

use serde::Serialize;

use crate::error::Error;
use crate::fingerprint;
use crate::grease::normalize_u16;
use crate::quic::TransportParameters;
use crate::reader::Reader;

/// A fully parsed ClientHello with its fingerprint IDs.
///
/// Field values mirror the wire message: list fields keep wire order, and
/// 16-bit GREASE codepoints in `extensions`, `named_groups`,
/// `supported_versions`, and `key_shares` are collapsed to 0x0A0A so that
/// per-connection GREASE randomization never leaks into comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientHello {
    #[serde(skip)]
    raw: Vec<u8>,

    /// Version from the TLS record header; 0 on the QUIC path.
    pub tls_record_version: u16,
    /// legacy_version from the ClientHello body.
    pub tls_handshake_version: u16,

    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    /// Extension IDs in wire order, GREASE collapsed.
    pub extensions: Vec<u16>,
    /// `extensions` sorted ascending.
    pub extensions_normalized: Vec<u16>,

    /// First HostName entry of server_name(0); empty when absent.
    pub server_name: String,
    /// supported_groups(10).
    pub named_groups: Vec<u16>,
    /// ec_point_formats(11).
    pub ec_point_formats: Vec<u8>,
    /// signature_algorithms(13).
    pub signature_schemes: Vec<u16>,
    /// alpn(16) protocol names.
    pub alpn: Vec<String>,
    /// compress_certificate(27).
    pub cert_compression_algos: Vec<u16>,
    /// record_size_limit(28).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_size_limit: Option<u16>,
    /// supported_versions(43).
    pub supported_versions: Vec<u16>,
    /// psk_key_exchange_modes(45).
    pub psk_kex_modes: Vec<u8>,
    /// key_share(51) group IDs.
    pub key_shares: Vec<u16>,
    /// application_settings(17513) protocol names.
    pub application_settings: Vec<String>,
    /// quic_transport_parameters(57); present only on the QUIC path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quic_transport_parameters: Option<TransportParameters>,

    pub num_id: u64,
    pub hex_id: String,
    pub norm_num_id: u64,
    pub norm_hex_id: String,

    // Hash-only state: the verbatim alpn(16) extension body and the
    // key_exchange byte length paired with each key_shares entry.
    #[serde(skip)]
    pub(crate) alpn_raw: Vec<u8>,
    #[serde(skip)]
    pub(crate) key_share_lengths: Vec<u16>,
}

impl ClientHello {
    fn empty() -> Self {
        ClientHello {
            raw: Vec::new(),
            tls_record_version: 0,
            tls_handshake_version: 0,
            cipher_suites: Vec::new(),
            compression_methods: Vec::new(),
            extensions: Vec::new(),
            extensions_normalized: Vec::new(),
            server_name: String::new(),
            named_groups: Vec::new(),
            ec_point_formats: Vec::new(),
            signature_schemes: Vec::new(),
            alpn: Vec::new(),
            cert_compression_algos: Vec::new(),
            record_size_limit: None,
            supported_versions: Vec::new(),
            psk_kex_modes: Vec::new(),
            key_shares: Vec::new(),
            application_settings: Vec::new(),
            quic_transport_parameters: None,
            num_id: 0,
            hex_id: String::new(),
            norm_num_id: 0,
            norm_hex_id: String::new(),
            alpn_raw: Vec::new(),
            key_share_lengths: Vec::new(),
        }
    }

    /// The captured input bytes: the full TLS record on the record path,
    /// the handshake message on the QUIC path.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// key_exchange byte lengths, parallel to `key_shares`.
    pub fn key_share_lengths(&self) -> &[u16] {
        &self.key_share_lengths
    }
}

/// Parse a ClientHello from a full TLS record.
///
/// The input must start with the 5-byte record header: content type 0x16
/// (Handshake), record version, payload length. Bytes after the record are
/// ignored.
pub fn parse_record(raw: &[u8]) -> Result<ClientHello, Error> {
    let mut r = Reader::new(raw);
    let content_type = r.take_u8()?;
    if content_type != 0x16 {
        return Err(Error::NotHandshake(content_type));
    }
    let record_version = r.take_u16()?;
    let payload = r.take_u16_prefixed()?;

    let mut hello = parse_handshake(payload)?;
    hello.tls_record_version = record_version;
    hello.raw = raw[..5 + payload.len()].to_vec();
    Ok(hello)
}

/// Parse a ClientHello from a bare handshake message (type byte, u24
/// length, body), the form found in a reassembled QUIC CRYPTO stream.
/// Bytes after the message are ignored.
pub fn parse_body(raw: &[u8]) -> Result<ClientHello, Error> {
    parse_handshake(raw)
}

fn parse_handshake(raw: &[u8]) -> Result<ClientHello, Error> {
    let mut r = Reader::new(raw);
    let hs_type = r.take_u8()?;
    if hs_type != 0x01 {
        return Err(Error::NotClientHello(hs_type));
    }
    let body = r.take_u24_prefixed()?;

    let mut hello = ClientHello::empty();
    hello.raw = raw[..raw.len() - r.remaining()].to_vec();
    parse_hello_body(body, &mut hello)?;

    hello.extensions_normalized = hello.extensions.clone();
    hello.extensions_normalized.sort_unstable();

    fingerprint::assign_ids(&mut hello);
    Ok(hello)
}

fn parse_hello_body(body: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(body);

    hello.tls_handshake_version = r.take_u16()?;
    r.skip(32)?; // random
    r.take_u8_prefixed()?; // legacy_session_id

    let suites = r.take_u16_prefixed()?;
    let mut sr = Reader::new(suites);
    while !sr.is_empty() {
        hello.cipher_suites.push(sr.take_u16()?);
    }

    hello.compression_methods = r.take_u8_prefixed()?.to_vec();

    if r.is_empty() {
        return Ok(()); // no extensions block at all
    }

    let exts = r.take_u16_prefixed()?;
    let mut er = Reader::new(exts);
    while !er.is_empty() {
        let id = er.take_u16()?;
        let data = er.take_u16_prefixed()?;
        hello.extensions.push(normalize_u16(id));
        extensions::parse(id, data, hello).map_err(|e| e.in_extension(id))?;
    }
    Ok(())
}

//! Capture-side TLS/QUIC ClientHello parsing and fingerprinting.
//!
//! The library turns the first handshake flight of a connection into a
//! [`tls::ClientHello`] record and two stable 64-bit fingerprint IDs:
//!
//! - [`tls::parse_record`] consumes a full TLS record read off a stream.
//! - [`tls::parse_body`] consumes a bare handshake message.
//! - [`quic::parse_initial`] consumes the decrypted payload of a QUIC
//!   Initial packet, reassembling its CRYPTO frames first. Frame decoding
//!   and reassembly are also available separately via
//!   [`quic::read_frames`] and [`quic::reassemble_crypto`].
//!
//! Parsing performs no I/O and holds no shared state. A call returns
//! either a fully populated record or the first error encountered, never
//! a partial record.

pub mod error;
pub mod grease;
pub mod quic;
pub mod tls;

mod fingerprint;
mod reader;

pub use error::Error;
pub use tls::ClientHello;

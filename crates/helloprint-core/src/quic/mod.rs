//! QUIC Initial packet payload parsing.
//!
//! The caller is expected to have removed header protection and AEAD
//! decryption already (RFC 9001); this module consumes the decrypted
//! payload. The well-known salts that decryption starts from are exposed
//! via [`initial_salt`] so capture frontends do not need to duplicate the
//! constants.

pub mod frame;
pub mod transport_params;

pub use frame::{read_frames, reassemble_crypto, Frame};
pub use transport_params::{TransportParameter, TransportParameters};

use crate::error::Error;
use crate::tls::{self, ClientHello};

/// QUIC v1 Initial salt (RFC 9001 §5.2).
pub const INITIAL_SALT_V1: [u8; 20] = [
    0x38, 0x76, 0x2c, 0xf7, 0xf5, 0x59, 0x34, 0xb3, 0x4d, 0x17, 0x9a, 0xe6, 0xa4, 0xc8, 0x0c,
    0xad, 0xcc, 0xbb, 0x7f, 0x0a,
];

/// QUIC v2 Initial salt (RFC 9369 §3.3.1).
pub const INITIAL_SALT_V2: [u8; 20] = [
    0x0d, 0xed, 0xe3, 0xde, 0xf7, 0x00, 0xa6, 0xdb, 0x81, 0x93, 0x81, 0xbe, 0x6e, 0x26, 0x9d,
    0xcb, 0xf9, 0xbd, 0x2e, 0xd9,
];

/// The Initial-secret salt for a QUIC version number, when known.
pub fn initial_salt(version: u32) -> Option<&'static [u8; 20]> {
    match version {
        0x0000_0001 => Some(&INITIAL_SALT_V1),
        0x6b33_43cf => Some(&INITIAL_SALT_V2),
        _ => None,
    }
}

/// Parse the ClientHello carried by a decrypted QUIC Initial payload.
///
/// Decodes the frame sequence, reassembles the CRYPTO stream, and parses
/// it as a handshake message. The returned record carries the decoded
/// quic_transport_parameters extension and a zero
/// `tls_record_version` (QUIC has no TLS record layer).
///
/// A ClientHello split across several Initial packets cannot be parsed
/// from one payload; collect the CRYPTO frames of every packet with
/// [`read_frames`] and feed the combined list through
/// [`reassemble_crypto`] and [`tls::parse_body`] instead.
pub fn parse_initial(payload: &[u8]) -> Result<ClientHello, Error> {
    let frames = read_frames(payload)?;
    let stream = reassemble_crypto(&frames)?;
    tls::parse_body(&stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salts_for_known_versions() {
        assert_eq!(initial_salt(0x0000_0001), Some(&INITIAL_SALT_V1));
        assert_eq!(initial_salt(0x6b33_43cf), Some(&INITIAL_SALT_V2));
        assert_eq!(initial_salt(0xff00_001d), None);
        assert_eq!(initial_salt(0), None);
    }
}

//! Fingerprint ID computation.
//!
//! Two 64-bit IDs are derived from each ClientHello by hashing a canonical
//! byte stream with FNV-1a: the raw ID over extension IDs in wire order,
//! and the normalized ID over the sorted extension list with GREASE-shaped
//! QUIC transport parameter IDs collapsed as well. Fields that clients
//! randomize per connection (random, session ID, key material) are never
//! part of the stream, so the IDs are stable across connections from the
//! same implementation.

use crate::grease::{is_grease_quic_tp, GREASE_QUIC_TP_PLACEHOLDER};
use crate::tls::ClientHello;

/// 64-bit FNV-1a with the standard offset basis and prime. This function
/// is part of the fingerprint definition: changing it changes every ID.
struct Fnv64(u64);

impl Fnv64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Fnv64(Self::OFFSET_BASIS)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    fn write_u16(&mut self, v: u16) {
        self.write(&v.to_be_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write(&v.to_be_bytes());
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Compute and store both fingerprint IDs on a freshly parsed record.
pub(crate) fn assign_ids(hello: &mut ClientHello) {
    hello.num_id = hash_stream(hello, false);
    hello.norm_num_id = hash_stream(hello, true);
    hello.hex_id = format!("{:016x}", hello.num_id);
    hello.norm_hex_id = format!("{:016x}", hello.norm_num_id);
}

/// Feed the canonical field stream into FNV-1a.
///
/// Stored list fields are already GREASE-collapsed where the wire format
/// admits GREASE, so the raw and normalized streams differ only in the
/// extension ordering and in the transport parameter IDs.
fn hash_stream(hello: &ClientHello, normalized: bool) -> u64 {
    let mut h = Fnv64::new();

    h.write_u16(hello.tls_handshake_version);

    h.write_u16(hello.cipher_suites.len() as u16);
    for &suite in &hello.cipher_suites {
        h.write_u16(suite);
    }

    h.write_u8(hello.compression_methods.len() as u8);
    h.write(&hello.compression_methods);

    let extensions = if normalized {
        &hello.extensions_normalized
    } else {
        &hello.extensions
    };
    h.write_u16(extensions.len() as u16);
    for &ext in extensions {
        h.write_u16(ext);
    }

    // supported_groups: u16 byte count, then the group IDs.
    h.write_u16(2 * hello.named_groups.len() as u16);
    for &group in &hello.named_groups {
        h.write_u16(group);
    }

    // ec_point_formats: u8 byte count, then the format bytes.
    h.write_u8(hello.ec_point_formats.len() as u8);
    h.write(&hello.ec_point_formats);

    // signature_algorithms: u16 byte count, then the scheme IDs.
    h.write_u16(2 * hello.signature_schemes.len() as u16);
    for &scheme in &hello.signature_schemes {
        h.write_u16(scheme);
    }

    // The alpn extension body verbatim, internal list length included.
    h.write(&hello.alpn_raw);

    // compress_certificate: u8 byte count, then the algorithm IDs.
    h.write_u8(2 * hello.cert_compression_algos.len() as u8);
    for &algo in &hello.cert_compression_algos {
        h.write_u16(algo);
    }

    // key_share: group and key_exchange length pairs, no outer prefix.
    for (&group, &len) in hello.key_shares.iter().zip(&hello.key_share_lengths) {
        h.write_u16(group);
        h.write_u16(len);
    }

    // Transport parameter IDs and value lengths in wire order; values are
    // key material and randomized limits, so they stay out of the stream.
    if let Some(params) = &hello.quic_transport_parameters {
        for param in params.iter() {
            let id = if normalized && is_grease_quic_tp(param.id) {
                GREASE_QUIC_TP_PLACEHOLDER
            } else {
                param.id
            };
            h.write_u64(id);
            h.write_u64(param.value.len() as u64);
        }
    }

    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls;

    #[test]
    fn fnv64_reference_values() {
        let mut h = Fnv64::new();
        h.write(b"");
        assert_eq!(h.finish(), 0xcbf2_9ce4_8422_2325);

        let mut h = Fnv64::new();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);

        let mut h = Fnv64::new();
        h.write(b"foobar");
        assert_eq!(h.finish(), 0x85944171f73967e8);
    }

    fn build_hello(random: u8, extensions: &[u8]) -> Vec<u8> {
        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[random; 32]);
        body.push(0x00);
        body.extend_from_slice(&[0x00, 0x04, 0x13, 0x01, 0x13, 0x02]);
        body.extend_from_slice(&[0x01, 0x00]);
        if !extensions.is_empty() {
            body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
            body.extend_from_slice(extensions);
        }
        let len = body.len() as u32;
        let mut msg = vec![0x01, (len >> 16) as u8, (len >> 8) as u8, len as u8];
        msg.extend_from_slice(&body);
        msg
    }

    fn ext(id: u16, data: &[u8]) -> Vec<u8> {
        let mut out = id.to_be_bytes().to_vec();
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn random_does_not_affect_ids() {
        let a = tls::parse_body(&build_hello(0x00, &[])).unwrap();
        let b = tls::parse_body(&build_hello(0xff, &[])).unwrap();
        assert_eq!(a.num_id, b.num_id);
        assert_eq!(a.norm_num_id, b.norm_num_id);
    }

    #[test]
    fn record_header_does_not_affect_ids() {
        let body = build_hello(0x42, &[]);
        let mut record = vec![0x16, 0x03, 0x01];
        record.extend_from_slice(&(body.len() as u16).to_be_bytes());
        record.extend_from_slice(&body);

        let from_record = tls::parse_record(&record).unwrap();
        let from_body = tls::parse_body(&body).unwrap();
        assert_eq!(from_record.num_id, from_body.num_id);
        assert_eq!(from_record.norm_num_id, from_body.norm_num_id);
    }

    #[test]
    fn extension_order_affects_raw_id_only() {
        let mut forward = ext(45, &[0x01, 0x01]);
        forward.extend_from_slice(&ext(28, &[0x40, 0x01]));
        let mut reversed = ext(28, &[0x40, 0x01]);
        reversed.extend_from_slice(&ext(45, &[0x01, 0x01]));

        let a = tls::parse_body(&build_hello(0x00, &forward)).unwrap();
        let b = tls::parse_body(&build_hello(0x00, &reversed)).unwrap();
        assert_ne!(a.num_id, b.num_id);
        assert_eq!(a.norm_num_id, b.norm_num_id);
    }

    #[test]
    fn key_share_payload_bytes_do_not_affect_ids() {
        // Same group and key length, different key material.
        let mut ks_a = vec![0x00, 0x24, 0x00, 0x1d, 0x00, 0x20];
        ks_a.extend_from_slice(&[0x11; 32]);
        let mut ks_b = vec![0x00, 0x24, 0x00, 0x1d, 0x00, 0x20];
        ks_b.extend_from_slice(&[0x77; 32]);

        let a = tls::parse_body(&build_hello(0x00, &ext(51, &ks_a))).unwrap();
        let b = tls::parse_body(&build_hello(0x00, &ext(51, &ks_b))).unwrap();
        assert_eq!(a.num_id, b.num_id);

        // A different key length is part of the fingerprint.
        let mut ks_c = vec![0x00, 0x25, 0x00, 0x1d, 0x00, 0x21];
        ks_c.extend_from_slice(&[0x11; 33]);
        let c = tls::parse_body(&build_hello(0x00, &ext(51, &ks_c))).unwrap();
        assert_ne!(a.num_id, c.num_id);
    }

    #[test]
    fn hex_ids_render_sixteen_lowercase_digits() {
        let hello = tls::parse_body(&build_hello(0x00, &[])).unwrap();
        assert_eq!(hello.hex_id.len(), 16);
        assert_eq!(hello.norm_hex_id.len(), 16);
        assert!(hello
            .hex_id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(hello.hex_id, format!("{:016x}", hello.num_id));
    }

    #[test]
    fn grease_codepoint_choice_does_not_affect_ids() {
        // The same layout with different GREASE draws hashes identically.
        let mut a_exts = ext(0x1a1a, &[]);
        a_exts.extend_from_slice(&ext(43, &[0x04, 0x2a, 0x2a, 0x03, 0x04]));
        let mut b_exts = ext(0xcaca, &[]);
        b_exts.extend_from_slice(&ext(43, &[0x04, 0xfa, 0xfa, 0x03, 0x04]));

        let a = tls::parse_body(&build_hello(0x00, &a_exts)).unwrap();
        let b = tls::parse_body(&build_hello(0x00, &b_exts)).unwrap();
        assert_eq!(a.num_id, b.num_id);
        assert_eq!(a.norm_num_id, b.norm_num_id);
    }

    #[test]
    fn dropping_a_grease_extension_changes_raw_id() {
        let mut with = ext(0x1a1a, &[]);
        with.extend_from_slice(&ext(45, &[0x01, 0x01]));
        let without = ext(45, &[0x01, 0x01]);

        let a = tls::parse_body(&build_hello(0x00, &with)).unwrap();
        let b = tls::parse_body(&build_hello(0x00, &without)).unwrap();
        assert_ne!(a.num_id, b.num_id);
        assert_ne!(a.norm_num_id, b.norm_num_id);
    }
}

//! Per-extension decoders.
//!
//! A recognized extension that fails to decode is fatal for the whole
//! parse; the error carries the extension ID. Extensions not listed here
//! are kept in the ID sequence only.

use crate::error::Error;
use crate::grease::{is_grease_u16, normalize_u16};
use crate::quic::TransportParameters;
use crate::reader::Reader;
use crate::tls::ClientHello;

const SERVER_NAME: u16 = 0;
const SUPPORTED_GROUPS: u16 = 10;
const EC_POINT_FORMATS: u16 = 11;
const SIGNATURE_ALGORITHMS: u16 = 13;
const ALPN: u16 = 16;
const COMPRESS_CERTIFICATE: u16 = 27;
const RECORD_SIZE_LIMIT: u16 = 28;
const SUPPORTED_VERSIONS: u16 = 43;
const PSK_KEY_EXCHANGE_MODES: u16 = 45;
const KEY_SHARE: u16 = 51;
const QUIC_TRANSPORT_PARAMETERS: u16 = 57;
const APPLICATION_SETTINGS: u16 = 17513;

pub(super) fn parse(id: u16, data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    if is_grease_u16(id) {
        return Ok(()); // GREASE extension bodies carry nothing real
    }
    match id {
        SERVER_NAME => parse_server_name(data, hello),
        SUPPORTED_GROUPS => parse_supported_groups(data, hello),
        EC_POINT_FORMATS => parse_ec_point_formats(data, hello),
        SIGNATURE_ALGORITHMS => parse_signature_algorithms(data, hello),
        ALPN => parse_alpn(data, hello),
        COMPRESS_CERTIFICATE => parse_compress_certificate(data, hello),
        RECORD_SIZE_LIMIT => parse_record_size_limit(data, hello),
        SUPPORTED_VERSIONS => parse_supported_versions(data, hello),
        PSK_KEY_EXCHANGE_MODES => parse_psk_kex_modes(data, hello),
        KEY_SHARE => parse_key_share(data, hello),
        QUIC_TRANSPORT_PARAMETERS => parse_transport_parameters(data, hello),
        APPLICATION_SETTINGS => parse_application_settings(data, hello),
        _ => Ok(()),
    }
}

fn parse_server_name(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        let name_type = lr.take_u8()?;
        let name = lr.take_u16_prefixed()?;
        if name_type == 0x00 && hello.server_name.is_empty() {
            hello.server_name = String::from_utf8_lossy(name).into_owned();
        }
    }
    Ok(())
}

fn parse_supported_groups(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        hello.named_groups.push(normalize_u16(lr.take_u16()?));
    }
    Ok(())
}

fn parse_ec_point_formats(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    hello.ec_point_formats = r.take_u8_prefixed()?.to_vec();
    Ok(())
}

fn parse_signature_algorithms(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        hello.signature_schemes.push(lr.take_u16()?);
    }
    Ok(())
}

fn parse_alpn(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    // The verbatim body (internal list length included) feeds the hasher.
    hello.alpn_raw = data.to_vec();

    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        let proto = lr.take_u8_prefixed()?;
        hello.alpn.push(String::from_utf8_lossy(proto).into_owned());
    }
    Ok(())
}

fn parse_compress_certificate(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u8_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        hello.cert_compression_algos.push(lr.take_u16()?);
    }
    Ok(())
}

fn parse_record_size_limit(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    hello.record_size_limit = Some(r.take_u16()?);
    Ok(())
}

fn parse_supported_versions(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u8_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        hello
            .supported_versions
            .push(normalize_u16(lr.take_u16()?));
    }
    Ok(())
}

fn parse_psk_kex_modes(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    hello.psk_kex_modes = r.take_u8_prefixed()?.to_vec();
    Ok(())
}

fn parse_key_share(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        let group = lr.take_u16()?;
        let key_exchange = lr.take_u16_prefixed()?;
        hello.key_shares.push(normalize_u16(group));
        hello.key_share_lengths.push(key_exchange.len() as u16);
    }
    Ok(())
}

fn parse_transport_parameters(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    hello.quic_transport_parameters = Some(TransportParameters::parse(data)?);
    Ok(())
}

fn parse_application_settings(data: &[u8], hello: &mut ClientHello) -> Result<(), Error> {
    let mut r = Reader::new(data);
    let list = r.take_u16_prefixed()?;
    let mut lr = Reader::new(list);
    while !lr.is_empty() {
        let proto = lr.take_u8_prefixed()?;
        hello
            .application_settings
            .push(String::from_utf8_lossy(proto).into_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls;

    fn hello_with_extensions(extensions: &[u8]) -> Result<tls::ClientHello, Error> {
        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[0u8; 32]);
        body.push(0x00);
        body.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
        body.extend_from_slice(&[0x01, 0x00]);
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(extensions);

        let len = body.len() as u32;
        let mut msg = vec![0x01, (len >> 16) as u8, (len >> 8) as u8, len as u8];
        msg.extend_from_slice(&body);
        tls::parse_body(&msg)
    }

    fn ext(id: u16, data: &[u8]) -> Vec<u8> {
        let mut out = id.to_be_bytes().to_vec();
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn server_name_first_hostname_wins() {
        // Two entries; only the first type-0 name is recorded.
        let mut sni = vec![0x00, 0x1a];
        sni.extend_from_slice(&[0x00, 0x00, 0x0b]);
        sni.extend_from_slice(b"example.com");
        sni.extend_from_slice(&[0x00, 0x00, 0x09]);
        sni.extend_from_slice(b"other.com");
        let hello = hello_with_extensions(&ext(0, &sni)).unwrap();
        assert_eq!(hello.server_name, "example.com");
        assert_eq!(hello.extensions, vec![0]);
    }

    #[test]
    fn supported_groups_normalized() {
        let groups = [0x00, 0x06, 0xba, 0xba, 0x00, 0x1d, 0x00, 0x17];
        let hello = hello_with_extensions(&ext(10, &groups)).unwrap();
        assert_eq!(hello.named_groups, vec![0x0A0A, 0x001d, 0x0017]);
    }

    #[test]
    fn alpn_list_and_raw_body() {
        let alpn = [0x00, 0x0c, 0x02, b'h', b'2', 0x08, b'h', b't', b't', b'p', b'/', b'1', b'.', b'1'];
        let hello = hello_with_extensions(&ext(16, &alpn)).unwrap();
        assert_eq!(hello.alpn, vec!["h2", "http/1.1"]);
        assert_eq!(hello.alpn_raw, alpn);
    }

    #[test]
    fn key_share_groups_and_lengths() {
        // GREASE group with a 1-byte key, x25519 with a 32-byte key.
        let mut ks = vec![0x00, 0x29];
        ks.extend_from_slice(&[0xda, 0xda, 0x00, 0x01, 0x00]);
        ks.extend_from_slice(&[0x00, 0x1d, 0x00, 0x20]);
        ks.extend_from_slice(&[0xab; 32]);
        let hello = hello_with_extensions(&ext(51, &ks)).unwrap();
        assert_eq!(hello.key_shares, vec![0x0A0A, 0x001d]);
        assert_eq!(hello.key_share_lengths(), &[1, 32]);
    }

    #[test]
    fn supported_versions_normalized() {
        let versions = [0x06, 0x7a, 0x7a, 0x03, 0x04, 0x03, 0x03];
        let hello = hello_with_extensions(&ext(43, &versions)).unwrap();
        assert_eq!(hello.supported_versions, vec![0x0A0A, 0x0304, 0x0303]);
    }

    #[test]
    fn record_size_limit_value() {
        let hello = hello_with_extensions(&ext(28, &[0x40, 0x01])).unwrap();
        assert_eq!(hello.record_size_limit, Some(0x4001));
    }

    #[test]
    fn grease_extension_id_collapsed() {
        let mut exts = ext(0x3a3a, &[]);
        exts.extend_from_slice(&ext(45, &[0x01, 0x01]));
        let hello = hello_with_extensions(&exts).unwrap();
        assert_eq!(hello.extensions, vec![0x0A0A, 45]);
        assert_eq!(hello.psk_kex_modes, vec![0x01]);
    }

    #[test]
    fn unknown_extension_id_preserved() {
        let hello = hello_with_extensions(&ext(0xfafe, &[0xde, 0xad])).unwrap();
        assert_eq!(hello.extensions, vec![0xfafe]);
    }

    #[test]
    fn normalized_extension_list_sorted() {
        let mut exts = ext(51, &[0x00, 0x00]);
        exts.extend_from_slice(&ext(0, &[0x00, 0x00]));
        exts.extend_from_slice(&ext(43, &[0x02, 0x03, 0x04]));
        let hello = hello_with_extensions(&exts).unwrap();
        assert_eq!(hello.extensions, vec![51, 0, 43]);
        assert_eq!(hello.extensions_normalized, vec![0, 43, 51]);

        // Sorting again changes nothing.
        let mut resorted = hello.extensions_normalized.clone();
        resorted.sort_unstable();
        assert_eq!(resorted, hello.extensions_normalized);
    }

    #[test]
    fn malformed_extension_carries_id() {
        // supported_groups claiming 6 bytes of list but carrying 2.
        let truncated = ext(10, &[0x00, 0x06, 0x00, 0x1d]);
        let err = hello_with_extensions(&truncated).unwrap_err();
        assert!(matches!(err, Error::MalformedExtension { id: 10, .. }));
    }

    #[test]
    fn odd_length_u16_list_is_fatal() {
        let err = hello_with_extensions(&ext(13, &[0x00, 0x03, 0x04, 0x03, 0x04])).unwrap_err();
        assert!(matches!(err, Error::MalformedExtension { id: 13, .. }));
    }

    #[test]
    fn application_settings_decoded() {
        let alps = [0x00, 0x03, 0x02, b'h', b'2'];
        let hello = hello_with_extensions(&ext(17513, &alps)).unwrap();
        assert_eq!(hello.application_settings, vec!["h2"]);
        assert_eq!(hello.extensions, vec![17513]);
    }
}

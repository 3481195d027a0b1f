//! QUIC transport_parameters extension decoding.

use serde::Serialize;

use crate::error::Error;
use crate::reader::Reader;

/// One transport parameter: varint ID and opaque value bytes.
///
/// Well-known IDs are not decoded further; the raw value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportParameter {
    pub id: u64,
    #[serde(serialize_with = "hex_value")]
    pub value: Vec<u8>,
}

/// The transport parameter list in wire order.
///
/// Order and duplicate IDs are preserved: both are part of the client's
/// fingerprint surface, so the list is never sorted or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TransportParameters(pub Vec<TransportParameter>);

impl TransportParameters {
    /// Decode id/length/value tuples until the buffer is exhausted.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(data);
        let mut params = Vec::new();
        while !r.is_empty() {
            let id = r.take_varint()?;
            let len = r.take_varint()?;
            let value = r.take(len as usize)?.to_vec();
            params.push(TransportParameter { id, value });
        }
        Ok(TransportParameters(params))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransportParameter> {
        self.0.iter()
    }

    /// First value carried under `id`, if any.
    pub fn get(&self, id: u64) -> Option<&[u8]> {
        self.iter()
            .find(|p| p.id == id)
            .map(|p| p.value.as_slice())
    }
}

fn hex_value<S: serde::Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(value))
}

use thiserror::Error;

/// Errors produced while parsing ClientHello records, QUIC frames, or
/// transport parameters.
///
/// No error is recovered internally: the first failure aborts the call and
/// no partial record is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input ended before a required field.
    #[error("short read: wanted {wanted} bytes, have {have}")]
    ShortRead { wanted: usize, have: usize },

    /// TLS record content type is not Handshake (0x16).
    #[error("not a TLS handshake record (content type {0:#04x})")]
    NotHandshake(u8),

    /// Handshake message type is not ClientHello (0x01).
    #[error("not a ClientHello (handshake type {0:#04x})")]
    NotClientHello(u8),

    /// A recognized extension had an inconsistent length prefix or invalid
    /// content. Unrecognized extensions never produce this; they are kept
    /// by ID only.
    #[error("malformed extension {id:#06x}: {source}")]
    MalformedExtension {
        id: u16,
        #[source]
        source: Box<Error>,
    },

    /// QUIC frame type whose length cannot be determined.
    #[error("unknown QUIC frame type {frame_type:#04x}")]
    UnknownFrame { frame_type: u64 },

    /// CRYPTO reassembly cannot cover the stream without a hole.
    #[error("CRYPTO stream gap: covered up to {at}, next fragment at {next}")]
    CryptoGap { at: u64, next: u64 },

    /// Overlapping CRYPTO fragments disagree on a byte.
    #[error("conflicting CRYPTO fragment data at stream offset {offset}")]
    CryptoConflict { offset: u64 },

    /// QUIC variable-length integer overran the buffer.
    #[error("malformed QUIC varint")]
    BadVarint,
}

impl Error {
    /// Attach the extension ID a parse failure occurred in.
    pub(crate) fn in_extension(self, id: u16) -> Error {
        Error::MalformedExtension {
            id,
            source: Box::new(self),
        }
    }
}

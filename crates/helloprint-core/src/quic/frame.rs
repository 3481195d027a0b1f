//! QUIC Initial frame decoding and CRYPTO stream reassembly.

use crate::error::Error;
use crate::reader::Reader;

const TYPE_PADDING: u64 = 0x00;
const TYPE_PING: u64 = 0x01;
const TYPE_ACK: u64 = 0x02;
const TYPE_ACK_ECN: u64 = 0x03;
const TYPE_CRYPTO: u64 = 0x06;
const TYPE_CONNECTION_CLOSE: u64 = 0x1c;
const TYPE_CONNECTION_CLOSE_APP: u64 = 0x1d;

/// A frame decoded from a decrypted QUIC Initial payload.
///
/// CRYPTO data and CONNECTION_CLOSE reasons are zero-copy views into the
/// payload; the frame list borrows the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A run of PADDING bytes coalesced into one frame. `length` counts
    /// every byte of the run, the first type byte included.
    Padding { length: u64 },
    Ping,
    /// ACK / ACK_ECN, decoded only far enough to know its size.
    Ack { ecn: bool },
    Crypto {
        offset: u64,
        length: u64,
        data: &'a [u8],
    },
    ConnectionClose {
        error_code: u64,
        /// Offending frame type; present on 0x1c, absent on 0x1d.
        frame_type: Option<u64>,
        reason: &'a [u8],
    },
}

impl Frame<'_> {
    /// The wire frame type this variant was decoded from.
    pub fn frame_type(&self) -> u64 {
        match self {
            Frame::Padding { .. } => TYPE_PADDING,
            Frame::Ping => TYPE_PING,
            Frame::Ack { ecn: false } => TYPE_ACK,
            Frame::Ack { ecn: true } => TYPE_ACK_ECN,
            Frame::Crypto { .. } => TYPE_CRYPTO,
            Frame::ConnectionClose {
                frame_type: Some(_),
                ..
            } => TYPE_CONNECTION_CLOSE,
            Frame::ConnectionClose { .. } => TYPE_CONNECTION_CLOSE_APP,
        }
    }
}

/// Decode the payload of a decrypted QUIC Initial packet as a sequence of
/// frames until the buffer is exhausted.
///
/// Frame types other than PADDING, PING, ACK, CRYPTO, and CONNECTION_CLOSE
/// are fatal: frame length is type-dependent, so decoding cannot continue
/// past an unknown type.
pub fn read_frames(payload: &[u8]) -> Result<Vec<Frame<'_>>, Error> {
    let mut r = Reader::new(payload);
    let mut frames = Vec::new();

    while !r.is_empty() {
        let frame_type = r.take_varint()?;
        match frame_type {
            TYPE_PADDING => {
                let mut length = 1u64;
                while r.peek(1) == Some(&[0x00][..]) {
                    r.skip(1)?;
                    length += 1;
                }
                frames.push(Frame::Padding { length });
            }
            TYPE_PING => frames.push(Frame::Ping),
            TYPE_ACK | TYPE_ACK_ECN => {
                r.take_varint()?; // largest acknowledged
                r.take_varint()?; // ack delay
                let range_count = r.take_varint()?;
                r.take_varint()?; // first ack range
                for _ in 0..range_count {
                    r.take_varint()?; // gap
                    r.take_varint()?; // range length
                }
                if frame_type == TYPE_ACK_ECN {
                    r.take_varint()?; // ECT0
                    r.take_varint()?; // ECT1
                    r.take_varint()?; // ECN-CE
                }
                frames.push(Frame::Ack {
                    ecn: frame_type == TYPE_ACK_ECN,
                });
            }
            TYPE_CRYPTO => {
                let offset = r.take_varint()?;
                let length = r.take_varint()?;
                let data = r.take(length as usize)?;
                frames.push(Frame::Crypto {
                    offset,
                    length,
                    data,
                });
            }
            TYPE_CONNECTION_CLOSE | TYPE_CONNECTION_CLOSE_APP => {
                let error_code = r.take_varint()?;
                let offending = if frame_type == TYPE_CONNECTION_CLOSE {
                    Some(r.take_varint()?)
                } else {
                    None
                };
                let reason_len = r.take_varint()?;
                let reason = r.take(reason_len as usize)?;
                frames.push(Frame::ConnectionClose {
                    error_code,
                    frame_type: offending,
                    reason,
                });
            }
            other => return Err(Error::UnknownFrame { frame_type: other }),
        }
    }
    Ok(frames)
}

/// Reassemble the CRYPTO stream carried by a frame list into one
/// contiguous buffer covering `[0, max_end)`.
///
/// Fragments may arrive out of order and may overlap; overlapping bytes
/// must agree. A hole in the coverage fails with [`Error::CryptoGap`], a
/// disagreement with [`Error::CryptoConflict`].
pub fn reassemble_crypto(frames: &[Frame<'_>]) -> Result<Vec<u8>, Error> {
    let mut fragments: Vec<(u64, &[u8])> = frames
        .iter()
        .filter_map(|f| match f {
            Frame::Crypto { offset, data, .. } => Some((*offset, *data)),
            _ => None,
        })
        .collect();
    fragments.sort_by_key(|&(offset, _)| offset);

    let total = fragments
        .iter()
        .map(|&(offset, data)| offset + data.len() as u64)
        .max()
        .unwrap_or(0);

    let mut stream = Vec::with_capacity(total as usize);
    let mut cursor = 0u64;
    for (offset, data) in fragments {
        let end = offset + data.len() as u64;
        if offset > cursor {
            return Err(Error::CryptoGap {
                at: cursor,
                next: offset,
            });
        }

        // Bytes below the cursor were already written; they must match.
        let overlap = (cursor.min(end) - offset) as usize;
        let written = &stream[offset as usize..offset as usize + overlap];
        if let Some(i) = written.iter().zip(&data[..overlap]).position(|(a, b)| a != b) {
            return Err(Error::CryptoConflict {
                offset: offset + i as u64,
            });
        }

        if end <= cursor {
            continue; // fully covered duplicate
        }
        stream.extend_from_slice(&data[overlap..]);
        cursor = end;
    }
    Ok(stream)
}

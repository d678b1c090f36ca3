//! Newline-delimited envelope framing codec.
//!
//! Each envelope is one line of JSON terminated by `\n`. The decoder yields
//! raw lines so the caller can keep the original payload for the message log
//! and decide separately how to parse it. Lines longer than the configured
//! maximum are discarded up to the next newline.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{P2pError, P2pResult};
use crate::protocol::Envelope;

/// Codec for newline-delimited JSON envelopes.
#[derive(Debug)]
pub struct EnvelopeCodec {
    /// Maximum line length in bytes, excluding the newline.
    max_frame_size: usize,
    /// Offset already scanned for a newline without finding one.
    next_index: usize,
    /// Dropping the tail of an oversized line until the next newline.
    discarding: bool,
}

impl EnvelopeCodec {
    /// Create a codec accepting lines of up to `max_frame_size` bytes.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for EnvelopeCodec {
    type Item = String;
    type Error = P2pError;

    fn decode(&mut self, src: &mut BytesMut) -> P2pResult<Option<Self::Item>> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|i| i + self.next_index);

            match newline {
                Some(pos) if self.discarding => {
                    src.advance(pos + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                None if self.discarding => {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                Some(pos) => {
                    self.next_index = 0;
                    let frame = src.split_to(pos + 1);
                    let mut line = &frame[..pos];
                    if let [rest @ .., b'\r'] = line {
                        line = rest;
                    }

                    if line.len() > self.max_frame_size {
                        return Err(P2pError::FrameTooLarge {
                            size: line.len(),
                            max: self.max_frame_size,
                        });
                    }

                    let text = std::str::from_utf8(line).map_err(|_| P2pError::InvalidUtf8)?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    return Ok(Some(text.to_string()));
                }
                None if src.len() > self.max_frame_size => {
                    let size = src.len();
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(P2pError::FrameTooLarge {
                        size,
                        max: self.max_frame_size,
                    });
                }
                None => {
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }
}

impl<'a> Encoder<&'a Envelope> for EnvelopeCodec {
    type Error = P2pError;

    fn encode(&mut self, envelope: &'a Envelope, dst: &mut BytesMut) -> P2pResult<()> {
        let (_, frame) = encode_line(envelope, self.max_frame_size)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

/// Serialize `envelope` once for writing to several connections.
///
/// Returns the JSON text, as recorded in the message log, and the
/// newline-terminated frame.
pub fn encode_line(envelope: &Envelope, max_frame_size: usize) -> P2pResult<(String, BytesMut)> {
    let json = envelope.to_json()?;
    if json.len() > max_frame_size {
        return Err(P2pError::FrameTooLarge {
            size: json.len(),
            max: max_frame_size,
        });
    }

    let mut frame = BytesMut::with_capacity(json.len() + 1);
    frame.put_slice(json.as_bytes());
    frame.put_u8(b'\n');
    Ok((json, frame))
}

//! Content-Length framing codec
//!
//! Each frame is a `Content-Length: <N>` header line, one separator line and
//! then exactly `N` bytes of JSON text. The decoder yields raw bodies so that
//! a body which fails to parse can be skipped without ending the stream.

use bytes::{ BufMut, Bytes, BytesMut };
use serde::Serialize;
use tokio_util::codec::{ Decoder, Encoder };

use crate::errors::Error;

const HEADER_NAME: &[u8] = b"content-length: ";

/// Largest body accepted from a peer (10 MiB)
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    /// Scanning lines for a `Content-Length` header
    #[default]
    Header,
    /// Header seen, the separator line is next
    Separator(usize),
    /// Waiting for this many body bytes
    Body(usize),
}

/// Codec for `Content-Length` framed JSON messages
#[derive(Debug, Default)]
pub struct ContentLengthCodec {
    state: DecodeState,
}

impl ContentLengthCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self::default()
    }
}

/// Take one line, including its terminator, off the front of the buffer
fn take_line(src: &mut BytesMut) -> Option<BytesMut> {
    let end = src.iter().position(|b| *b == b'\n')?;
    Some(src.split_to(end + 1))
}

/// Find `Content-Length: <digits>` anywhere in the line, ignoring case
fn parse_content_length(line: &[u8]) -> Option<usize> {
    let start = line
        .windows(HEADER_NAME.len())
        .position(|window| window.eq_ignore_ascii_case(HEADER_NAME))?;
    let digits: &[u8] = &line[start + HEADER_NAME.len()..];
    let len = digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 {
        return None;
    }
    std::str
        ::from_utf8(&digits[..len])
        .ok()
        .and_then(|n| n.parse().ok())
}

impl Decoder for ContentLengthCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::Header => {
                    let Some(line) = take_line(src) else {
                        return Ok(None);
                    };
                    match parse_content_length(&line) {
                        Some(len) if len > MAX_FRAME_SIZE => {
                            tracing::warn!(
                                "Framing error: Content-Length {} exceeds limit of {} bytes; header skipped",
                                len,
                                MAX_FRAME_SIZE
                            );
                        }
                        Some(len) => {
                            self.state = DecodeState::Separator(len);
                        }
                        None => {
                            tracing::trace!("Ignoring non-header line of {} bytes", line.len());
                        }
                    }
                }
                DecodeState::Separator(len) => {
                    if take_line(src).is_none() {
                        return Ok(None);
                    }
                    self.state = DecodeState::Body(len);
                }
                DecodeState::Body(len) => {
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    self.state = DecodeState::Header;
                    return Ok(Some(src.split_to(len).freeze()));
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        match self.state {
            DecodeState::Body(len) => {
                tracing::warn!(
                    "Framing error: stream ended after {} of {} body bytes; frame dropped",
                    buf.len(),
                    len
                );
            }
            DecodeState::Separator(_) => {
                tracing::warn!("Framing error: stream ended before frame body; frame dropped");
            }
            DecodeState::Header if !buf.is_empty() => {
                tracing::debug!("Discarding {} trailing bytes at end of stream", buf.len());
            }
            DecodeState::Header => {}
        }
        buf.clear();
        self.state = DecodeState::Header;
        Ok(None)
    }
}

impl<T> Encoder<&T> for ContentLengthCodec where T: Serialize + ?Sized {
    type Error = Error;

    fn encode(&mut self, item: &T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(item)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        dst.reserve(header.len() + body.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }
}

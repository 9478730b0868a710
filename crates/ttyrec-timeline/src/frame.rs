//! The ttyrec frame format.
//!
//! A log is a sequence of frames stored back to back with no padding and no
//! terminator. Every frame is a 12-byte header of three 32-bit integers
//! (`seconds`, `microseconds`, `amount`) followed by exactly `amount` payload
//! bytes. A well-formed log is therefore exactly `sum(12 + amount_i)` bytes
//! long; anything left over at the end is a truncation, never an empty frame.
//!
//! [`FrameDecoder`] walks an in-memory buffer without copying payloads,
//! [`FrameReader`] does the same over any [`Read`] implementation, and
//! [`FrameEncoder`] produces logs in the same layout.

use std::fmt;
use std::io::{self, Read};
use std::iter::FusedIterator;
use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result, TimelineError};

/// Length of a frame header in bytes.
pub const HEADER_LEN: usize = 12;

/// Upper bound on the buffer reserved up front for a streamed payload.
const READ_RESERVE_LIMIT: usize = 64 * 1024;

/// Byte order of the three header integers.
///
/// ttyrec writes the header in the producing machine's order, which is
/// little-endian on every platform it is commonly run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
    /// Whatever this machine uses.
    Native,
}

impl ByteOrder {
    /// Read one header integer from `buf`, advancing it by four bytes.
    fn get_u32(self, buf: &mut impl Buf) -> u32 {
        match self {
            Self::Little => buf.get_u32_le(),
            Self::Big => buf.get_u32(),
            Self::Native => buf.get_u32_ne(),
        }
    }

    /// Append one header integer to `buf`.
    fn put_u32(self, buf: &mut impl BufMut, value: u32) {
        match self {
            Self::Little => buf.put_u32_le(value),
            Self::Big => buf.put_u32(value),
            Self::Native => buf.put_u32_ne(value),
        }
    }

    /// Name used in configuration files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "little" | "le" | "little-endian" => Ok(Self::Little),
            "big" | "be" | "big-endian" => Ok(Self::Big),
            "native" | "ne" => Ok(Self::Native),
            other => Err(TimelineError::config(format!(
                "unknown byte order '{other}' (expected little, big or native)"
            ))),
        }
    }
}

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Whole seconds of the wall-clock timestamp.
    pub seconds: u32,
    /// Microseconds part of the timestamp.
    pub microseconds: u32,
    /// Payload length in bytes.
    pub amount: u32,
}

impl FrameHeader {
    /// Parse a header from the first 12 bytes of `buf`.
    ///
    /// Returns `None` if fewer than 12 bytes are available.
    #[must_use]
    pub fn parse(mut buf: &[u8], byte_order: ByteOrder) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            seconds: byte_order.get_u32(&mut buf),
            microseconds: byte_order.get_u32(&mut buf),
            amount: byte_order.get_u32(&mut buf),
        })
    }

    /// Append the encoded header to `buf`.
    pub fn write(&self, buf: &mut impl BufMut, byte_order: ByteOrder) {
        byte_order.put_u32(buf, self.seconds);
        byte_order.put_u32(buf, self.microseconds);
        byte_order.put_u32(buf, self.amount);
    }

    /// Total encoded length of the frame this header introduces.
    #[must_use]
    pub const fn frame_len(&self) -> u64 {
        HEADER_LEN as u64 + self.amount as u64
    }
}

/// One timestamped chunk of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Whole seconds of the wall-clock timestamp.
    pub seconds: u32,
    /// Microseconds part of the timestamp.
    pub microseconds: u32,
    /// Raw terminal output, escape sequences included.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame.
    #[must_use]
    pub fn new(seconds: u32, microseconds: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            seconds,
            microseconds,
            payload: payload.into(),
        }
    }

    /// Absolute timestamp in milliseconds, rounded up.
    ///
    /// Equal to `ceil(seconds * 1000 + microseconds / 1000)`. Computed in
    /// integers so it is exact for every header value.
    #[must_use]
    pub const fn timing_ms(&self) -> i64 {
        self.seconds as i64 * 1000 + self.microseconds.div_ceil(1000) as i64
    }

    /// Header describing this frame.
    ///
    /// Payloads longer than `u32::MAX` cannot be described and yield `None`.
    #[must_use]
    pub fn header(&self) -> Option<FrameHeader> {
        let amount = u32::try_from(self.payload.len()).ok()?;
        Some(FrameHeader {
            seconds: self.seconds,
            microseconds: self.microseconds,
            amount,
        })
    }

    /// Encoded length of this frame.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }
}

/// Lazy decoder over an in-memory log.
///
/// Yields frames in stream order. The first truncation is yielded as an
/// error and ends the iteration; frames yielded before it remain valid.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    buf: Bytes,
    pos: usize,
    byte_order: ByteOrder,
    failed: bool,
}

impl FrameDecoder {
    /// Create a decoder reading little-endian headers.
    #[must_use]
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
            byte_order: ByteOrder::default(),
            failed: false,
        }
    }

    /// Set the header byte order.
    #[must_use]
    pub const fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Byte offset of the next frame.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Total length of the underlying log.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.buf.len()
    }

    fn fail(&mut self, err: FrameError) -> Option<std::result::Result<Frame, FrameError>> {
        self.failed = true;
        tracing::warn!(offset = err.offset(), error = %err, "ttyrec log is truncated");
        Some(Err(err))
    }
}

impl Iterator for FrameDecoder {
    type Item = std::result::Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }

        let offset = self.pos as u64;
        let remaining = self.remaining();
        let Some(header) = FrameHeader::parse(&self.buf[self.pos..], self.byte_order) else {
            return self.fail(FrameError::TruncatedHeader { offset, remaining });
        };

        let available = remaining - HEADER_LEN;
        let amount = match usize::try_from(header.amount) {
            Ok(amount) if amount <= available => amount,
            _ => {
                return self.fail(FrameError::TruncatedPayload {
                    offset,
                    expected: header.amount,
                    available,
                });
            }
        };

        let start = self.pos + HEADER_LEN;
        let payload = self.buf.slice(start..start + amount);
        self.pos = start + amount;

        tracing::trace!(
            offset,
            seconds = header.seconds,
            microseconds = header.microseconds,
            amount,
            "decoded frame"
        );

        Some(Ok(Frame {
            seconds: header.seconds,
            microseconds: header.microseconds,
            payload,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.remaining();
        // Every frame costs at least a header; a short tail still yields one error.
        (0, Some(remaining.div_ceil(HEADER_LEN)))
    }
}

impl FusedIterator for FrameDecoder {}

/// Streaming decoder over any reader.
///
/// A clean end of input at a frame boundary ends the iteration. End of
/// input inside a frame is reported as [`TimelineError::Truncated`]; other
/// I/O failures are reported as they occur. Either error ends the iteration.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    byte_order: ByteOrder,
    position: u64,
    frames: usize,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader decoding little-endian headers.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            byte_order: ByteOrder::default(),
            position: 0,
            frames: 0,
            done: false,
        }
    }

    /// Set the header byte order.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Recover the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let offset = self.position;
        let mut raw = [0u8; HEADER_LEN];
        let got = read_full(&mut self.reader, &mut raw)
            .map_err(|e| TimelineError::io_context("reading frame header", e))?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(self.truncated(FrameError::TruncatedHeader {
                offset,
                remaining: got,
            }));
        }

        let Some(header) = FrameHeader::parse(&raw, self.byte_order) else {
            return Err(self.truncated(FrameError::TruncatedHeader {
                offset,
                remaining: got,
            }));
        };

        let amount = u64::from(header.amount);
        let reserve = usize::try_from(amount).map_or(READ_RESERVE_LIMIT, |n| n.min(READ_RESERVE_LIMIT));
        let mut payload = Vec::with_capacity(reserve);
        (&mut self.reader)
            .take(amount)
            .read_to_end(&mut payload)
            .map_err(|e| TimelineError::io_context("reading frame payload", e))?;
        if (payload.len() as u64) < amount {
            return Err(self.truncated(FrameError::TruncatedPayload {
                offset,
                expected: header.amount,
                available: payload.len(),
            }));
        }

        self.position += header.frame_len();
        self.frames += 1;
        tracing::trace!(
            offset,
            seconds = header.seconds,
            microseconds = header.microseconds,
            amount,
            "read frame"
        );

        Ok(Some(Frame {
            seconds: header.seconds,
            microseconds: header.microseconds,
            payload: Bytes::from(payload),
        }))
    }

    fn truncated(&self, err: FrameError) -> TimelineError {
        tracing::warn!(offset = err.offset(), error = %err, "ttyrec stream is truncated");
        TimelineError::truncated(self.frames, err)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for FrameReader<R> {}

/// Read until `buf` is full or the reader is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Builds a log in the ttyrec frame format.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    buf: BytesMut,
    byte_order: ByteOrder,
    frames: usize,
}

impl FrameEncoder {
    /// Create an encoder writing little-endian headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header byte order.
    #[must_use]
    pub const fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Append a frame built from its parts.
    pub fn push(&mut self, seconds: u32, microseconds: u32, payload: &[u8]) -> Result<&mut Self> {
        let amount = u32::try_from(payload.len())
            .map_err(|_| TimelineError::PayloadTooLarge { len: payload.len() })?;
        let header = FrameHeader {
            seconds,
            microseconds,
            amount,
        };
        self.buf.reserve(HEADER_LEN + payload.len());
        header.write(&mut self.buf, self.byte_order);
        self.buf.put_slice(payload);
        self.frames += 1;
        Ok(self)
    }

    /// Append an existing frame.
    pub fn push_frame(&mut self, frame: &Frame) -> Result<&mut Self> {
        self.push(frame.seconds, frame.microseconds, &frame.payload)
    }

    /// Number of frames written.
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frames
    }

    /// Encoded length so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and return the encoded log.
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(frames: &[(u32, u32, &str)]) -> Bytes {
        let mut enc = FrameEncoder::new();
        for &(s, us, p) in frames {
            enc.push(s, us, p.as_bytes()).unwrap();
        }
        enc.finish()
    }

    #[test]
    fn header_layout_little_endian() {
        let bytes = log(&[(1, 2, "xyz")]);
        assert_eq!(
            &bytes[..],
            &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, b'x', b'y', b'z']
        );
    }

    #[test]
    fn header_layout_big_endian() {
        let mut enc = FrameEncoder::new().with_byte_order(ByteOrder::Big);
        enc.push(1, 2, b"").unwrap();
        assert_eq!(&enc.finish()[..], &[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn decodes_frames_in_order() {
        let bytes = log(&[(10, 0, "a"), (10, 500, "bc"), (11, 0, "")]);
        let frames: Vec<_> = FrameDecoder::new(bytes).collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], Frame::new(10, 0, &b"a"[..]));
        assert_eq!(frames[1].payload, Bytes::from_static(b"bc"));
        assert!(frames[2].payload.is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut dec = FrameDecoder::new(Bytes::new());
        assert!(dec.next().is_none());
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn consumes_whole_stream() {
        let bytes = log(&[(0, 0, "hello"), (0, 1, "world!")]);
        let total = bytes.len();
        let mut dec = FrameDecoder::new(bytes);
        while let Some(frame) = dec.next() {
            frame.unwrap();
        }
        assert_eq!(dec.position(), total);
        assert_eq!(dec.remaining(), 0);
        assert_eq!(total, (12 + 5) + (12 + 6));
    }

    #[test]
    fn truncated_header_after_valid_frame() {
        let mut raw = log(&[(0, 0, "a")]).to_vec();
        raw.extend_from_slice(&[0u8; 8]);
        let mut dec = FrameDecoder::new(raw);

        assert!(dec.next().unwrap().is_ok());
        assert_eq!(
            dec.next().unwrap().unwrap_err(),
            FrameError::TruncatedHeader {
                offset: 13,
                remaining: 8
            }
        );
        assert!(dec.next().is_none());
    }

    #[test]
    fn truncated_payload_is_not_read_out_of_bounds() {
        let mut raw = Vec::new();
        FrameHeader {
            seconds: 0,
            microseconds: 0,
            amount: u32::MAX,
        }
        .write(&mut raw, ByteOrder::Little);
        raw.extend_from_slice(b"short");

        let err = FrameDecoder::new(raw).next().unwrap().unwrap_err();
        assert_eq!(
            err,
            FrameError::TruncatedPayload {
                offset: 0,
                expected: u32::MAX,
                available: 5
            }
        );
    }

    #[test]
    fn timing_rounds_up_to_millisecond() {
        assert_eq!(Frame::new(0, 0, Bytes::new()).timing_ms(), 0);
        assert_eq!(Frame::new(0, 1, Bytes::new()).timing_ms(), 1);
        assert_eq!(Frame::new(0, 999, Bytes::new()).timing_ms(), 1);
        assert_eq!(Frame::new(0, 1000, Bytes::new()).timing_ms(), 1);
        assert_eq!(Frame::new(0, 1001, Bytes::new()).timing_ms(), 2);
        assert_eq!(Frame::new(2, 500_000, Bytes::new()).timing_ms(), 2500);
    }

    #[test]
    fn timing_does_not_overflow() {
        let frame = Frame::new(u32::MAX, u32::MAX, Bytes::new());
        assert_eq!(
            frame.timing_ms(),
            i64::from(u32::MAX) * 1000 + i64::from(u32::MAX.div_ceil(1000))
        );
    }

    #[test]
    fn byte_order_parsing() {
        assert_eq!("little".parse::<ByteOrder>().unwrap(), ByteOrder::Little);
        assert_eq!("BE".parse::<ByteOrder>().unwrap(), ByteOrder::Big);
        assert_eq!("native".parse::<ByteOrder>().unwrap(), ByteOrder::Native);
        assert!("middle".parse::<ByteOrder>().is_err());
        assert_eq!(ByteOrder::Big.to_string(), "big");
    }

    #[test]
    fn reader_matches_decoder() {
        let bytes = log(&[(5, 0, "one"), (5, 250_000, "two")]);
        let from_reader: Vec<Frame> = FrameReader::new(&bytes[..])
            .collect::<Result<_>>()
            .unwrap();
        let from_decoder: Vec<Frame> = FrameDecoder::new(bytes.clone())
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(from_reader, from_decoder);
    }

    #[test]
    fn reader_reports_truncated_payload() {
        let mut raw = log(&[(0, 0, "ok")]).to_vec();
        FrameHeader {
            seconds: 0,
            microseconds: 0,
            amount: 10,
        }
        .write(&mut raw, ByteOrder::Little);
        raw.extend_from_slice(b"abc");

        let mut reader = FrameReader::new(&raw[..]);
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.is_truncation());
        assert_eq!(
            err.frame_error(),
            Some(&FrameError::TruncatedPayload {
                offset: 14,
                expected: 10,
                available: 3
            })
        );
        assert!(reader.next().is_none());
    }

    #[test]
    fn decoded_frames_reencode_identically() {
        let original = log(&[(7, 1, "ab"), (8, 999_999, ""), (9, 0, "\x1b[0m")]);
        let decoder = FrameDecoder::new(original.clone()).with_byte_order(ByteOrder::Little);
        assert_eq!(decoder.total_len(), original.len());

        let mut enc = FrameEncoder::new();
        for frame in decoder {
            let frame = frame.unwrap();
            let header = frame.header().unwrap();
            assert_eq!(header.amount as usize, frame.payload.len());
            assert_eq!(header.frame_len(), frame.encoded_len() as u64);
            enc.push_frame(&frame).unwrap();
        }
        assert_eq!(enc.frame_count(), 3);
        assert_eq!(enc.finish(), original);
    }

    #[test]
    fn header_of_frame() {
        let frame = Frame::new(3, 500, Bytes::from_static(b"xyz"));
        assert_eq!(
            frame.header(),
            Some(FrameHeader {
                seconds: 3,
                microseconds: 500,
                amount: 3
            })
        );
    }

    #[test]
    fn reader_tracks_position_and_returns_reader() {
        let bytes = log(&[(0, 0, "one"), (1, 0, "four")]);
        let mut raw = bytes.to_vec();
        raw.extend_from_slice(b"rest");

        // Only the first frame is pulled; the rest of the input stays unread.
        let mut reader = FrameReader::new(std::io::Cursor::new(raw));
        assert_eq!(reader.position(), 0);
        reader.next().unwrap().unwrap();
        assert_eq!(reader.position(), 15);

        let cursor = reader.into_inner();
        assert_eq!(cursor.position(), 15);
    }
}

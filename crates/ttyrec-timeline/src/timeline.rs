//! Playback timeline construction.
//!
//! The timeline is a fold over the decoded frames. [`TimingState`] carries
//! the only state the fold needs (the previous frame's timing and the running
//! offset), and [`TimingState::advance`] is a pure step from one state to the
//! next, so a single frame can be examined without replaying a whole log.
//!
//! Offsets are cumulative milliseconds since the first frame. They follow
//! the recorder's clock exactly: if the clock steps backwards, the offset
//! steps backwards by the same amount. Such steps are counted in
//! [`TimelineStats::non_monotonic_steps`] but never clamped.

use std::io::Read;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::DecoderConfig;
use crate::encoding::decode_utf8_lossy;
use crate::error::{FrameError, Result, TimelineError};
use crate::escape::quote_literal;
use crate::frame::{Frame, FrameDecoder, FrameReader};

/// Assumed average encoded frame size when sizing the entry buffer.
const ESTIMATED_FRAME_LEN: usize = 64;

/// Cap on the entry buffer reserved up front.
const MAX_INITIAL_CAPACITY: usize = 64 * 1024;

/// One step of the playback schedule.
///
/// Serializes as a two-element array `[text, offset_ms]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, i64)", into = "(String, i64)")]
pub struct TimelineEntry {
    /// The chunk as a quoted, escaped script literal.
    pub text: String,
    /// Milliseconds from the start of playback.
    pub offset_ms: i64,
}

impl TimelineEntry {
    /// Create an entry from already-quoted text.
    pub fn new(text: impl Into<String>, offset_ms: i64) -> Self {
        Self {
            text: text.into(),
            offset_ms,
        }
    }
}

impl From<(String, i64)> for TimelineEntry {
    fn from((text, offset_ms): (String, i64)) -> Self {
        Self { text, offset_ms }
    }
}

impl From<TimelineEntry> for (String, i64) {
    fn from(entry: TimelineEntry) -> Self {
        (entry.text, entry.offset_ms)
    }
}

/// Accumulator threaded through the fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingState {
    previous_timing: Option<i64>,
    cumulative_offset: i64,
}

impl TimingState {
    /// State before the first frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous_timing: None,
            cumulative_offset: 0,
        }
    }

    /// Timing of the last frame folded in, if any.
    #[must_use]
    pub const fn previous_timing(&self) -> Option<i64> {
        self.previous_timing
    }

    /// Offset assigned to the last frame folded in.
    #[must_use]
    pub const fn offset_ms(&self) -> i64 {
        self.cumulative_offset
    }

    /// Fold in a frame timing, returning the next state and the frame's offset.
    ///
    /// The first timing establishes the origin and always gets offset 0.
    #[must_use]
    pub const fn advance_timing(self, timing: i64) -> (Self, i64) {
        let offset = match self.previous_timing {
            Some(previous) => self
                .cumulative_offset
                .saturating_add(timing.saturating_sub(previous)),
            None => self.cumulative_offset,
        };
        let next = Self {
            previous_timing: Some(timing),
            cumulative_offset: offset,
        };
        (next, offset)
    }

    /// Fold in a frame, returning the next state and its timeline entry.
    #[must_use]
    pub fn advance(self, frame: &Frame) -> (Self, TimelineEntry) {
        let (next, offset_ms) = self.advance_timing(frame.timing_ms());
        let (entry, _) = make_entry(&frame.payload, offset_ms);
        (next, entry)
    }
}

/// Decode, escape and quote a payload. Also returns the replacement count.
fn make_entry(payload: &[u8], offset_ms: i64) -> (TimelineEntry, usize) {
    let decoded = decode_utf8_lossy(payload);
    let entry = TimelineEntry {
        text: quote_literal(&decoded.text),
        offset_ms,
    };
    (entry, decoded.replacements)
}

/// Counters gathered while building a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimelineStats {
    /// Frames folded in.
    pub frames: usize,
    /// Payload bytes seen.
    pub payload_bytes: u64,
    /// Steps where the recorder's clock went backwards.
    pub non_monotonic_steps: usize,
    /// Frames whose payload was not valid UTF-8.
    pub lossy_frames: usize,
}

/// Whether decoding reached the end of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every byte was consumed.
    Complete,
    /// The log ended mid-frame; entries cover the frames before the damage.
    Truncated(FrameError),
}

/// Incrementally builds a timeline from frames in stream order.
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    state: TimingState,
    entries: Vec<TimelineEntry>,
    stats: TimelineStats,
}

impl TimelineBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Create a builder sized for a log of `len` bytes.
    #[must_use]
    pub fn for_log_len(len: usize) -> Self {
        Self::with_capacity((len / ESTIMATED_FRAME_LEN).min(MAX_INITIAL_CAPACITY))
    }

    /// Fold in the next frame and return its entry.
    pub fn push(&mut self, frame: &Frame) -> &TimelineEntry {
        let previous = self.state.previous_timing();
        let timing = frame.timing_ms();
        if previous.is_some_and(|p| timing < p) {
            self.stats.non_monotonic_steps += 1;
            tracing::debug!(
                frame = self.stats.frames,
                previous = ?previous,
                timing,
                "recorder clock went backwards"
            );
        }

        let (next, offset_ms) = self.state.advance_timing(timing);
        let (entry, replacements) = make_entry(&frame.payload, offset_ms);
        if replacements > 0 {
            self.stats.lossy_frames += 1;
            tracing::debug!(
                frame = self.stats.frames,
                replacements,
                "payload is not valid UTF-8"
            );
        }

        self.state = next;
        self.stats.frames += 1;
        self.stats.payload_bytes += frame.payload.len() as u64;
        let index = self.entries.len();
        self.entries.push(entry);
        &self.entries[index]
    }

    /// Entries built so far.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of entries built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no frame has been folded in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish with the given decode status.
    #[must_use]
    pub fn finish(self, status: DecodeStatus) -> Timeline {
        tracing::debug!(
            frames = self.stats.frames,
            duration_ms = self.state.offset_ms(),
            complete = matches!(status, DecodeStatus::Complete),
            "timeline built"
        );
        Timeline {
            entries: self.entries,
            status,
            stats: self.stats,
        }
    }
}

/// The ordered playback schedule for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    status: DecodeStatus,
    stats: TimelineStats,
}

impl Timeline {
    /// The entries, in playback order.
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the recording had no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How decoding ended.
    #[must_use]
    pub const fn status(&self) -> DecodeStatus {
        self.status
    }

    /// Whether every byte of the log was decoded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.status, DecodeStatus::Complete)
    }

    /// The truncation that stopped decoding, if any.
    #[must_use]
    pub const fn truncation(&self) -> Option<&FrameError> {
        match &self.status {
            DecodeStatus::Complete => None,
            DecodeStatus::Truncated(err) => Some(err),
        }
    }

    /// Counters gathered while building.
    #[must_use]
    pub const fn stats(&self) -> &TimelineStats {
        &self.stats
    }

    /// Offset of the last entry, or 0 for an empty timeline.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.entries.last().map_or(0, |e| e.offset_ms)
    }

    /// Take the entries regardless of status.
    #[must_use]
    pub fn into_entries(self) -> Vec<TimelineEntry> {
        self.entries
    }

    /// Take the entries, failing if the log was truncated.
    pub fn into_result(self) -> Result<Vec<TimelineEntry>> {
        match self.status {
            DecodeStatus::Complete => Ok(self.entries),
            DecodeStatus::Truncated(err) => Err(TimelineError::truncated(self.entries.len(), err)),
        }
    }
}

/// Build the timeline for an in-memory log.
///
/// Never fails outright: a truncated log yields the entries decoded before
/// the damage with a [`DecodeStatus::Truncated`] status.
pub fn build_timeline(log: impl Into<Bytes>, config: &DecoderConfig) -> Timeline {
    let decoder = FrameDecoder::new(log).with_byte_order(config.byte_order);
    let mut builder = TimelineBuilder::for_log_len(decoder.total_len());

    for frame in decoder {
        match frame {
            Ok(frame) => {
                builder.push(&frame);
            }
            Err(err) => return builder.finish(DecodeStatus::Truncated(err)),
        }
    }
    builder.finish(DecodeStatus::Complete)
}

/// Build the timeline from a reader.
///
/// Truncation is reported through the timeline's status, as with
/// [`build_timeline`]; only genuine I/O failures are returned as errors.
pub fn read_timeline<R: Read>(reader: R, config: &DecoderConfig) -> Result<Timeline> {
    let mut builder = TimelineBuilder::new();
    let mut frames = FrameReader::new(reader).with_byte_order(config.byte_order);

    let mut status = DecodeStatus::Complete;
    for frame in frames.by_ref() {
        match frame {
            Ok(frame) => {
                builder.push(&frame);
            }
            Err(TimelineError::Truncated { source, .. }) => {
                status = DecodeStatus::Truncated(source);
                break;
            }
            Err(e) => return Err(e),
        }
    }
    tracing::debug!(bytes = frames.position(), frames = builder.len(), "log read");
    Ok(builder.finish(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameEncoder;

    fn frame(seconds: u32, microseconds: u32, payload: &'static [u8]) -> Frame {
        Frame::new(seconds, microseconds, payload)
    }

    #[test]
    fn first_frame_is_origin() {
        let (state, entry) = TimingState::new().advance(&frame(1_700_000_000, 123_456, b"x"));
        assert_eq!(entry.offset_ms, 0);
        assert_eq!(state.previous_timing(), Some(1_700_000_000_124));
        assert_eq!(state.offset_ms(), 0);
    }

    #[test]
    fn offsets_accumulate_deltas() {
        let state = TimingState::new();
        let (state, a) = state.advance(&frame(0, 0, b"a"));
        let (state, b) = state.advance(&frame(0, 500_000, b"b"));
        let (_, c) = state.advance(&frame(2, 0, b"c"));
        assert_eq!(
            [a, b, c],
            [
                TimelineEntry::new("'a'", 0),
                TimelineEntry::new("'b'", 500),
                TimelineEntry::new("'c'", 2000),
            ]
        );
    }

    #[test]
    fn backwards_clock_is_not_clamped() {
        let (state, _) = TimingState::new().advance_timing(10_000);
        let (state, offset) = state.advance_timing(9_000);
        assert_eq!(offset, -1_000);
        let (_, offset) = state.advance_timing(9_500);
        assert_eq!(offset, -500);
    }

    #[test]
    fn ceiling_separates_gap_across_ms_boundary() {
        let (state, _) = TimingState::new().advance(&frame(0, 1_000, b"a"));
        let (_, entry) = state.advance(&frame(0, 1_200, b"b"));
        assert_eq!(entry.offset_ms, 1);
    }

    #[test]
    fn gap_within_one_ms_collapses() {
        // 1001us and 1200us both round up to 2ms.
        let (state, _) = TimingState::new().advance(&frame(0, 1_001, b"a"));
        let (_, entry) = state.advance(&frame(0, 1_200, b"b"));
        assert_eq!(entry.offset_ms, 0);
    }

    #[test]
    fn builder_counts_stats() {
        let mut builder = TimelineBuilder::new();
        builder.push(&frame(5, 0, b"ok"));
        builder.push(&frame(4, 0, b"\xff"));
        builder.push(&frame(6, 0, b"done"));
        let timeline = builder.finish(DecodeStatus::Complete);

        let stats = timeline.stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.payload_bytes, 7);
        assert_eq!(stats.non_monotonic_steps, 1);
        assert_eq!(stats.lossy_frames, 1);
        assert_eq!(timeline.duration_ms(), 1000);
        assert_eq!(timeline.entries()[1].text, "'\\ufffd'");
    }

    #[test]
    fn empty_log_is_complete_and_empty() {
        let timeline = build_timeline(Bytes::new(), &DecoderConfig::default());
        assert!(timeline.is_complete());
        assert!(timeline.is_empty());
        assert_eq!(timeline.duration_ms(), 0);
        assert_eq!(timeline.into_result().unwrap(), Vec::new());
    }

    #[test]
    fn truncation_keeps_prior_entries() {
        let mut enc = FrameEncoder::new();
        enc.push(0, 0, b"a").unwrap();
        let mut raw = enc.finish().to_vec();
        raw.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let timeline = build_timeline(raw, &DecoderConfig::default());
        assert!(!timeline.is_complete());
        assert_eq!(timeline.entries(), &[TimelineEntry::new("'a'", 0)]);
        assert!(matches!(
            timeline.truncation(),
            Some(FrameError::TruncatedHeader { remaining: 8, .. })
        ));

        let err = timeline.into_result().unwrap_err();
        assert!(matches!(
            err,
            TimelineError::Truncated {
                frames_decoded: 1,
                ..
            }
        ));
    }

    #[test]
    fn entry_serializes_as_pair() {
        let entry = TimelineEntry::new("'a'", 500);
        assert_eq!(serde_json::to_string(&entry).unwrap(), r#"["'a'",500]"#);
        let back: TimelineEntry = serde_json::from_str(r#"["'b'",-3]"#).unwrap();
        assert_eq!(back, TimelineEntry::new("'b'", -3));
    }

    #[test]
    fn capacity_estimate_is_bounded() {
        assert_eq!(TimelineBuilder::for_log_len(0).entries.capacity(), 0);
        assert!(TimelineBuilder::for_log_len(usize::MAX).entries.capacity() <= MAX_INITIAL_CAPACITY * 2);
    }
}

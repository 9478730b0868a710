//! ttyrec-timeline: turn ttyrec terminal recordings into playback timelines
//!
//! A ttyrec log is a packed sequence of frames, each a chunk of raw terminal
//! output stamped with the wall-clock time it was written. This crate decodes
//! such a log and produces the schedule a player needs: every chunk as a
//! quoted, escaped script literal paired with its offset in milliseconds from
//! the start of the recording.
//!
//! # Features
//!
//! - **Zero-copy decoding** of in-memory logs via [`FrameDecoder`], or
//!   streaming from any reader via [`FrameReader`]
//! - **Configurable header byte order** ([`ByteOrder`])
//! - **Truncation is reported, not hidden**: frames before the damage are
//!   kept and the [`Timeline`] records where decoding stopped
//! - **Lossy UTF-8**: invalid output bytes become U+FFFD instead of failing
//! - **Render payload** serialization for template-based replay artifacts
//!
//! # Example
//!
//! ```
//! use ttyrec_timeline::{DecoderConfig, FrameEncoder, build_timeline};
//!
//! let mut log = FrameEncoder::new();
//! log.push(0, 0, b"a")?;
//! log.push(0, 500_000, b"b")?;
//!
//! let timeline = build_timeline(log.finish(), &DecoderConfig::default());
//! assert!(timeline.is_complete());
//!
//! let entries: Vec<(String, i64)> = timeline.into_entries().into_iter().map(Into::into).collect();
//! assert_eq!(entries, [("'a'".to_string(), 0), ("'b'".to_string(), 500)]);
//! # Ok::<(), ttyrec_timeline::TimelineError>(())
//! ```

pub mod config;
pub mod dimensions;
pub mod encoding;
pub mod error;
pub mod escape;
pub mod frame;
pub mod prelude;
pub mod recorder;
pub mod render;
pub mod timeline;

pub use config::{Config, DecoderConfig, RecorderConfig};
pub use dimensions::{DimensionProbe, DimensionSource, Dimensions, FallbackReason, ProbedDimensions};
pub use encoding::{DecodedText, decode_utf8_lossy};
pub use error::{FrameError, Result, TimelineError};
pub use escape::{escape_str, quote_literal};
pub use frame::{ByteOrder, Frame, FrameDecoder, FrameEncoder, FrameHeader, FrameReader, HEADER_LEN};
pub use recorder::Recorder;
pub use render::RenderPayload;
pub use timeline::{
    DecodeStatus, Timeline, TimelineBuilder, TimelineEntry, TimelineStats, TimingState,
    build_timeline, read_timeline,
};

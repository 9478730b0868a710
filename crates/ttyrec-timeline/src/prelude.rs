//! Convenient re-exports for common ttyrec-timeline usage.
//!
//! # Example
//!
//! ```
//! use ttyrec_timeline::prelude::*;
//!
//! let timeline: Timeline = build_timeline(Vec::new(), &DecoderConfig::default());
//! assert!(timeline.is_complete());
//! let entries: Vec<TimelineEntry> = timeline.into_entries();
//! assert!(entries.is_empty());
//! ```

// Decoding
pub use crate::config::DecoderConfig;
pub use crate::frame::{ByteOrder, FrameEncoder};

// Timeline
pub use crate::timeline::{DecodeStatus, Timeline, TimelineEntry, build_timeline, read_timeline};

// Error handling
pub use crate::error::{Result, TimelineError};

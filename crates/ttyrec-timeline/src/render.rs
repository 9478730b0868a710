//! The hand-off to the renderer.
//!
//! A renderer receives two template variables: `json`, the timeline as a JSON
//! array of `[text, offset_ms]` pairs, and `dimensions`, the terminal size as
//! `[height, width]`. [`RenderPayload`] produces both, or a single JSON
//! document holding them for renderers run as a separate process.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::dimensions::Dimensions;
use crate::error::{Result, TimelineError};
use crate::timeline::{Timeline, TimelineEntry};

/// Everything a renderer needs to produce a replay artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPayload {
    /// Playback schedule, in order.
    pub timeline: Vec<TimelineEntry>,
    /// Terminal size as `[height, width]`.
    pub dimensions: Dimensions,
}

impl RenderPayload {
    /// Create a payload from timeline entries.
    #[must_use]
    pub const fn new(timeline: Vec<TimelineEntry>, dimensions: Dimensions) -> Self {
        Self {
            timeline,
            dimensions,
        }
    }

    /// Create a payload from a decoded timeline, whatever its status.
    #[must_use]
    pub fn from_timeline(timeline: Timeline, dimensions: Dimensions) -> Self {
        Self::new(timeline.into_entries(), dimensions)
    }

    /// The timeline alone, as the `json` template variable expects it.
    pub fn timeline_json(&self) -> Result<String> {
        serde_json::to_string(&self.timeline).map_err(TimelineError::from)
    }

    /// The whole payload as one JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(TimelineError::from)
    }

    /// Write the whole payload as JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        TimelineError::with_io_context(writeln!(writer), "writing render payload")?;
        TimelineError::with_io_context(writer.flush(), "flushing render payload")
    }
}

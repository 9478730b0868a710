//! Configuration types for ttyrec-timeline.
//!
//! Configuration comes from three layers, later ones winning: built-in
//! defaults, an optional TOML or JSON file (see [`file`]), and environment
//! variables prefixed with `TTYREC_TIMELINE_` (see [`env`]).

pub mod env;
pub mod file;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dimensions::Dimensions;
use crate::error::Result;
use crate::frame::ByteOrder;

/// Default recorder program.
pub const DEFAULT_RECORDER: &str = "ttyrec";

/// Settings for the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Byte order of the frame header integers.
    pub byte_order: ByteOrder,
}

impl DecoderConfig {
    /// Create a decoder configuration with the given byte order.
    #[must_use]
    pub const fn new(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }
}

/// How to invoke the external session recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Program to run.
    pub program: String,
    /// Extra arguments placed before the recorder's own options.
    pub args: Vec<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RECORDER.to_string(),
            args: Vec::new(),
        }
    }
}

impl RecorderConfig {
    /// Use a different recorder program.
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the extra arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Frame decoder settings.
    pub decoder: DecoderConfig,
    /// Fixed terminal dimensions, bypassing probing.
    pub dimensions: Option<Dimensions>,
    /// Recorder invocation.
    pub recorder: RecorderConfig,
}

impl Config {
    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => file::load_config(path)?,
            None => Self::default(),
        };
        env::EnvConfig::default().apply(&mut config)?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Set the header byte order.
    #[must_use]
    pub const fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.decoder.byte_order = byte_order;
        self
    }

    /// Set fixed dimensions.
    #[must_use]
    pub const fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

//! Environment-based configuration overrides.

use super::Config;
use crate::dimensions::Dimensions;
use crate::error::{Result, TimelineError};

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "TTYREC_TIMELINE";

/// Recognised variable names, without the prefix.
pub mod vars {
    /// Header byte order.
    pub const BYTE_ORDER: &str = "BYTE_ORDER";
    /// Terminal height.
    pub const HEIGHT: &str = "HEIGHT";
    /// Terminal width.
    pub const WIDTH: &str = "WIDTH";
    /// Recorder program.
    pub const RECORDER: &str = "RECORDER";
}

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    prefix: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a reader using `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build the full environment variable name.
    #[must_use]
    pub fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        self.apply_with(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Height and width only take effect together; a malformed value is an
    /// error rather than being ignored.
    pub fn apply_with(
        &self,
        config: &mut Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let get = |name: &str| lookup(&self.var_name(name));

        if let Some(order) = get(vars::BYTE_ORDER) {
            config.decoder.byte_order = order.parse()?;
        }

        match (get(vars::HEIGHT), get(vars::WIDTH)) {
            (Some(height), Some(width)) => {
                config.dimensions = Some(Dimensions::new(
                    self.parse_size(vars::HEIGHT, &height)?,
                    self.parse_size(vars::WIDTH, &width)?,
                ));
            }
            (None, None) => {}
            _ => {
                return Err(TimelineError::config(format!(
                    "{} and {} must be set together",
                    self.var_name(vars::HEIGHT),
                    self.var_name(vars::WIDTH)
                )));
            }
        }

        if let Some(program) = get(vars::RECORDER) {
            config.recorder.program = program;
        }

        Ok(())
    }

    fn parse_size(&self, name: &str, value: &str) -> Result<u16> {
        value.trim().parse().map_err(|_| {
            TimelineError::config(format!("{}={value:?} is not a valid size", self.var_name(name)))
        })
    }
}

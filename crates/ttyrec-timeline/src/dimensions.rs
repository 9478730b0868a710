//! Terminal dimensions and how they were obtained.
//!
//! The renderer needs the size of the terminal the session was recorded in.
//! [`DimensionProbe`] tries each source in turn and records why every
//! skipped source was skipped:
//!
//! 1. dimensions given explicitly,
//! 2. the size of the controlling terminal,
//! 3. the `LINES` and `COLUMNS` environment variables,
//! 4. the 24x80 default.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default terminal height in rows.
pub const DEFAULT_HEIGHT: u16 = 24;

/// Default terminal width in columns.
pub const DEFAULT_WIDTH: u16 = 80;

/// Environment variable holding the terminal height.
pub const LINES_VAR: &str = "LINES";

/// Environment variable holding the terminal width.
pub const COLUMNS_VAR: &str = "COLUMNS";

/// Terminal size, serialized as `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct Dimensions {
    /// Height in rows.
    pub height: u16,
    /// Width in columns.
    pub width: u16,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(height: u16, width: u16) -> Self {
        Self { height, width }
    }

    /// Standard 24x80 terminal.
    pub const STANDARD: Self = Self::new(DEFAULT_HEIGHT, DEFAULT_WIDTH);

    /// Whether either side is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

impl From<(u16, u16)> for Dimensions {
    fn from((height, width): (u16, u16)) -> Self {
        Self::new(height, width)
    }
}

impl From<Dimensions> for (u16, u16) {
    fn from(dim: Dimensions) -> Self {
        (dim.height, dim.width)
    }
}

/// Where the final dimensions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    /// Supplied by the caller.
    Explicit,
    /// Queried from the controlling terminal.
    Terminal,
    /// Read from `LINES` and `COLUMNS`.
    Environment,
    /// The 24x80 default.
    Default,
}

/// Why a source was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No dimensions were supplied.
    NotExplicit,
    /// Terminal probing was disabled, e.g. when replaying an existing log.
    ProbeDisabled,
    /// The terminal could not be queried.
    NotATerminal(String),
    /// A source reported a zero-sized terminal.
    ZeroSize(DimensionSource),
    /// An environment variable is not set.
    EnvMissing(&'static str),
    /// An environment variable is set but not a valid size.
    EnvInvalid {
        /// Variable name.
        var: &'static str,
        /// Its value.
        value: String,
    },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExplicit => f.write_str("no explicit dimensions"),
            Self::ProbeDisabled => f.write_str("terminal probing disabled"),
            Self::NotATerminal(reason) => write!(f, "terminal size unavailable: {reason}"),
            Self::ZeroSize(source) => write!(f, "{source:?} reported a zero size"),
            Self::EnvMissing(var) => write!(f, "{var} is not set"),
            Self::EnvInvalid { var, value } => write!(f, "{var}={value:?} is not a valid size"),
        }
    }
}

/// Result of a dimension probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedDimensions {
    /// The dimensions to use.
    pub dimensions: Dimensions,
    /// Where they came from.
    pub source: DimensionSource,
    /// Why each earlier source was skipped, in order.
    pub fallbacks: Vec<FallbackReason>,
}

/// Function used to ask the controlling terminal for its size.
pub type TerminalQuery = fn() -> std::io::Result<Dimensions>;

/// Resolves terminal dimensions through the fallback chain.
#[derive(Debug, Clone)]
pub struct DimensionProbe {
    explicit: Option<Dimensions>,
    probe_terminal: bool,
    terminal: TerminalQuery,
}

impl Default for DimensionProbe {
    fn default() -> Self {
        Self {
            explicit: None,
            probe_terminal: true,
            terminal: query_terminal,
        }
    }
}

impl DimensionProbe {
    /// Create a probe that queries the controlling terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these dimensions if present.
    #[must_use]
    pub const fn explicit(mut self, dimensions: Option<Dimensions>) -> Self {
        self.explicit = dimensions;
        self
    }

    /// Enable or disable querying the controlling terminal and environment.
    ///
    /// With probing disabled, anything but explicit dimensions falls back to
    /// the default. This matches replaying a log recorded elsewhere, where the
    /// current terminal says nothing about the recording.
    #[must_use]
    pub const fn probe_terminal(mut self, probe: bool) -> Self {
        self.probe_terminal = probe;
        self
    }

    /// Replace the terminal query.
    #[must_use]
    pub fn with_terminal_query(mut self, query: TerminalQuery) -> Self {
        self.terminal = query;
        self
    }

    /// Resolve using the process environment.
    #[must_use]
    pub fn resolve(&self) -> ProbedDimensions {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` for environment variables.
    #[must_use]
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> ProbedDimensions {
        let mut fallbacks = Vec::new();

        if let Some(dimensions) = self.explicit {
            return found(dimensions, DimensionSource::Explicit, fallbacks);
        }
        fallbacks.push(FallbackReason::NotExplicit);

        if !self.probe_terminal {
            fallbacks.push(FallbackReason::ProbeDisabled);
            return found(Dimensions::STANDARD, DimensionSource::Default, fallbacks);
        }

        match (self.terminal)() {
            Ok(dimensions) if !dimensions.is_empty() => {
                return found(dimensions, DimensionSource::Terminal, fallbacks);
            }
            Ok(_) => fallbacks.push(FallbackReason::ZeroSize(DimensionSource::Terminal)),
            Err(e) => fallbacks.push(FallbackReason::NotATerminal(e.to_string())),
        }

        match env_dimensions(&lookup) {
            Ok(dimensions) if !dimensions.is_empty() => {
                return found(dimensions, DimensionSource::Environment, fallbacks);
            }
            Ok(_) => fallbacks.push(FallbackReason::ZeroSize(DimensionSource::Environment)),
            Err(reason) => fallbacks.push(reason),
        }

        found(Dimensions::STANDARD, DimensionSource::Default, fallbacks)
    }
}

fn found(
    dimensions: Dimensions,
    source: DimensionSource,
    fallbacks: Vec<FallbackReason>,
) -> ProbedDimensions {
    for reason in &fallbacks {
        tracing::debug!(%reason, "dimension source skipped");
    }
    tracing::debug!(%dimensions, ?source, "terminal dimensions resolved");
    ProbedDimensions {
        dimensions,
        source,
        fallbacks,
    }
}

fn query_terminal() -> std::io::Result<Dimensions> {
    let (cols, rows) = crossterm::terminal::size()?;
    Ok(Dimensions::new(rows, cols))
}

fn env_dimensions(
    lookup: &impl Fn(&str) -> Option<String>,
) -> std::result::Result<Dimensions, FallbackReason> {
    let height = env_size(lookup, LINES_VAR)?;
    let width = env_size(lookup, COLUMNS_VAR)?;
    Ok(Dimensions::new(height, width))
}

fn env_size(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> std::result::Result<u16, FallbackReason> {
    let value = lookup(var).ok_or(FallbackReason::EnvMissing(var))?;
    value
        .trim()
        .parse()
        .map_err(|_| FallbackReason::EnvInvalid { var, value })
}

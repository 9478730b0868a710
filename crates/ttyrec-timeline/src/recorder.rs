//! Invoking the external session recorder.
//!
//! Capturing a session is the recorder's job; this module only runs it with
//! the right arguments and reports whether it succeeded. The recorder is
//! invoked as `program [args..] [-e command] output`, which is the ttyrec
//! command line.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::config::RecorderConfig;
use crate::error::{Result, TimelineError};

/// Runs the configured recorder.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    config: RecorderConfig,
}

impl Recorder {
    /// Create a recorder from its configuration.
    #[must_use]
    pub const fn new(config: RecorderConfig) -> Self {
        Self { config }
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// Build the command without running it.
    ///
    /// `command` is passed with `-e` so the recorder runs it instead of a
    /// shell.
    #[must_use]
    pub fn command(&self, command: Option<&str>, output: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        if let Some(command) = command {
            cmd.arg("-e").arg(command);
        }
        cmd.arg(output);
        cmd
    }

    /// Record a session into `output`, blocking until the recorder exits.
    pub fn record(&self, command: Option<&str>, output: &Path) -> Result<()> {
        tracing::info!(
            program = %self.config.program,
            command = command.unwrap_or("<shell>"),
            output = %output.display(),
            "starting recorder"
        );

        let status = self.command(command, output).status().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TimelineError::recorder(format!("'{}' not found", self.config.program))
            } else {
                TimelineError::io_context(format!("running '{}'", self.config.program), e)
            }
        })?;

        if !status.success() {
            return Err(TimelineError::recorder(format!(
                "'{}' exited with {status}",
                self.config.program
            )));
        }

        tracing::info!(output = %output.display(), "recording finished");
        Ok(())
    }
}

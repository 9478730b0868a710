//! File-based configuration loading.

use std::path::Path;

use super::Config;
use crate::error::{Result, TimelineError};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Load a configuration file, choosing the format by extension.
///
/// Files without a recognised extension are read as TOML.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TimelineError::io_context(format!("reading config {}", path.display()), e))?;
    let format = ConfigFormat::from_path(path).unwrap_or(ConfigFormat::Toml);
    parse_config(&content, format)
        .map_err(|e| TimelineError::config(format!("{}: {e}", path.display())))
}

/// Parse config content.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| TimelineError::config(e.to_string())),
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| TimelineError::config(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimensions;
    use crate::frame::ByteOrder;

    #[test]
    fn format_detection() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(
            ConfigFormat::from_path(Path::new("/etc/timeline.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("timeline.yaml")), None);
    }

    #[test]
    fn parse_toml_full() {
        let content = r#"
            dimensions = [30, 100]

            [decoder]
            byte_order = "big"

            [recorder]
            program = "/usr/local/bin/ttyrec"
            args = ["-a"]
        "#;
        let config = parse_config(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.decoder.byte_order, ByteOrder::Big);
        assert_eq!(config.dimensions, Some(Dimensions::new(30, 100)));
        assert_eq!(config.recorder.program, "/usr/local/bin/ttyrec");
        assert_eq!(config.recorder.args, vec!["-a".to_string()]);
    }

    #[test]
    fn parse_toml_partial_keeps_defaults() {
        let config = parse_config("[decoder]\nbyte_order = \"native\"\n", ConfigFormat::Toml).unwrap();
        assert_eq!(config.decoder.byte_order, ByteOrder::Native);
        assert_eq!(config.recorder.program, "ttyrec");
        assert_eq!(config.dimensions, None);
    }

    #[test]
    fn parse_json() {
        let config = parse_config(
            r#"{"decoder": {"byte_order": "little"}, "dimensions": [24, 80]}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(config.dimensions, Some(Dimensions::STANDARD));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("colour = true\n", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, TimelineError::Config { .. }));
    }

    #[test]
    fn bad_byte_order_is_rejected() {
        assert!(parse_config("[decoder]\nbyte_order = \"middle\"\n", ConfigFormat::Toml).is_err());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.toml");
        std::fs::write(&path, "dimensions = [50, 160]\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.dimensions, Some(Dimensions::new(50, 160)));

        let missing = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, TimelineError::IoWithContext { .. }));
    }
}

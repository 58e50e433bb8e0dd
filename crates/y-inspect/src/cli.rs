//! Core logic of the `y-inspect` command-line tool.
//!
//! Input is a transcript: one hex-encoded update per line. A line starting
//! with `remote ` is tagged as a remote update; blank lines and lines
//! starting with `#` are skipped.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::InspectorConfig;
use crate::inspector::{Inspector, InspectorError};
use crate::report::Report;
use crate::undo::Origin;

pub const USAGE: &str = "usage: y-inspect [--config <path>] [--gc] [--track-remote] [--flat] < transcript";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Parsed command-line flags. Flags only ever switch settings on top of the
/// config file; they never switch them back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
    pub gc: bool,
    pub track_remote: bool,
    pub flat: bool,
    pub help: bool,
}

impl CliOptions {
    /// Parses arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut opts = CliOptions::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    let path = args
                        .get(i)
                        .ok_or_else(|| CliError::MissingValue("--config".into()))?;
                    opts.config_path = Some(PathBuf::from(path));
                }
                "--gc" => opts.gc = true,
                "--track-remote" => opts.track_remote = true,
                "--flat" => opts.flat = true,
                "-h" | "--help" => opts.help = true,
                other => return Err(CliError::UnknownArgument(other.to_string())),
            }
            i += 1;
        }
        Ok(opts)
    }

    /// Loads the config file, if any, and applies the flags on top.
    pub fn config(&self) -> Result<InspectorConfig, CliError> {
        let mut config = match &self.config_path {
            Some(path) => InspectorConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => InspectorConfig::default(),
        };
        if self.gc {
            config.gc = true;
        }
        if self.track_remote {
            config.ignore_remote_changes = false;
        }
        if self.flat {
            config.group_structs = false;
        }
        Ok(config)
    }
}

/// A transcript line that was rejected. Line numbers start at 1.
#[derive(Debug)]
pub struct LineError {
    pub line: usize,
    pub error: InspectorError,
}

/// Feeds every update line of `input` to `inspector`. Rejected lines are
/// returned and do not stop the rest of the transcript.
pub fn feed_transcript(inspector: &mut Inspector, input: &str) -> Vec<LineError> {
    let mut errors = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (origin, hex) = match line.strip_prefix("remote ") {
            Some(rest) => (Origin::Remote, rest),
            None => (Origin::Local, line),
        };
        if let Err(error) = inspector.on_update_hex(hex, origin) {
            errors.push(LineError { line: n + 1, error });
        }
    }
    info!(
        accepted = inspector.updates().len(),
        rejected = errors.len(),
        "transcript processed"
    );
    errors
}

/// Runs a whole transcript and renders the report as pretty JSON.
pub fn run(input: &str, config: InspectorConfig) -> Result<(String, Vec<LineError>), CliError> {
    let mut inspector = Inspector::new(config);
    let errors = feed_transcript(&mut inspector, input);
    let json = serde_json::to_string_pretty(&Report::build(&inspector))?;
    Ok((json, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        let opts = CliOptions::parse(&args(&["--gc", "--config", "y.toml", "--flat"])).unwrap();
        assert!(opts.gc && opts.flat && !opts.track_remote);
        assert_eq!(opts.config_path, Some(PathBuf::from("y.toml")));
        let config = CliOptions { config_path: None, ..opts }.config().unwrap();
        assert!(config.gc);
        assert!(!config.group_structs);
        assert!(config.ignore_remote_changes);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            CliOptions::parse(&args(&["--config"])),
            Err(CliError::MissingValue(_))
        ));
        assert!(matches!(
            CliOptions::parse(&args(&["--verbose"])),
            Err(CliError::UnknownArgument(a)) if a == "--verbose"
        ));
    }

    #[test]
    fn transcript_skips_comments_and_reports_bad_lines() {
        // Replica 1 inserts "ab" into root text "t".
        let input = "# session\n\n010101000401017402616200\nzz\nremote 010101\n";
        let mut inspector = Inspector::default();
        let errors = feed_transcript(&mut inspector, input);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 4);
        assert_eq!(errors[1].line, 5);
        assert!(matches!(
            errors[1].error,
            InspectorError::Decode(DecodeError::UnexpectedEof)
        ));
        assert_eq!(inspector.updates().len(), 1);
    }

    #[test]
    fn run_renders_json_report() {
        let (json, errors) = run("010101000401017402616200\n", InspectorConfig::default()).unwrap();
        assert!(errors.is_empty());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["state_vector"][0]["clock"], 2);
        assert_eq!(value["chains"][0][1]["content"][0], "b");
    }
}

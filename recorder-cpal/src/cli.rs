//! Command-line interface for take-recorder
//!
//! Handles argument parsing, logging configuration and the line commands read
//! from stdin while the recorder runs.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

use recorder_core::models::config::RecorderConfig;

/// take-recorder - record a take, preview it and crop it from the terminal
#[derive(Parser, Debug)]
#[command(name = "take-recorder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the original and trimmed takes
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Stop recording automatically after this many seconds (0 = unlimited)
    #[arg(long, default_value_t = 0.0)]
    pub max_duration: f64,

    /// Disable the crop surface
    #[arg(long)]
    pub no_crop: bool,

    /// JSON recorder configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Build the recorder configuration from the optional file plus flags.
    pub fn recorder_config(&self) -> anyhow::Result<RecorderConfig> {
        let mut config = match &self.config {
            Some(path) => RecorderConfig::from_json_file(path)?,
            None => RecorderConfig::new(default_storage_dir()),
        };

        if let Some(dir) = &self.storage_dir {
            config.storage_root = dir.clone();
        }
        if self.max_duration != 0.0 {
            config = config.with_max_duration(self.max_duration);
        }
        if self.no_crop {
            config = config.with_cropping(false);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `<data dir>/take-recorder`, or the working directory when there is none.
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("take-recorder"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Keep dependencies (cpal backends in particular) at warn
    builder.filter_level(LevelFilter::Warn);

    builder.filter_module("recorder_core", args.log_level());
    builder.filter_module("recorder_cpal", args.log_level());
    builder.filter_module("take_recorder", args.log_level());

    builder.format_timestamp_millis().init();
}

/// One line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ToggleRecord,
    Stop,
    TogglePlay,
    EnterCrop,
    ExitCrop,
    DragLeft(f64),
    DragRight(f64),
    Trim,
    Done,
    Quit,
    Help,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: {0} (type ? for help)")]
    Unknown(String),

    #[error("{0} needs a handle position between 0 and 1")]
    MissingPosition(&'static str),

    #[error("invalid handle position: {0}")]
    InvalidPosition(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(None);
        };

        let command = match word {
            "r" | "record" => Self::ToggleRecord,
            "s" | "stop" => Self::Stop,
            "p" | "play" => Self::TogglePlay,
            "c" | "crop" => Self::EnterCrop,
            "x" | "exit" => Self::ExitCrop,
            "l" | "left" => Self::DragLeft(position(parts.next(), "left")?),
            "h" | "right" => Self::DragRight(position(parts.next(), "right")?),
            "t" | "trim" => Self::Trim,
            "d" | "done" => Self::Done,
            "q" | "quit" => Self::Quit,
            "help" | "?" => Self::Help,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn position(arg: Option<&str>, handle: &'static str) -> Result<f64, CommandError> {
    let arg = arg.ok_or(CommandError::MissingPosition(handle))?;
    let value: f64 = arg
        .parse()
        .map_err(|_| CommandError::InvalidPosition(arg.to_string()))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(CommandError::InvalidPosition(arg.to_string()));
    }
    Ok(value)
}

pub const HELP: &str = "\
commands:
  r          start, pause or resume recording
  s          stop recording
  p          play or pause the take (or the crop preview)
  c / x      enter / leave the crop surface
  l <0..1>   move the left crop handle
  h <0..1>   move the right crop handle
  t          trim the take to the selected range
  d          done: keep the current take and quit
  q          discard everything and quit
  ?          show this help";

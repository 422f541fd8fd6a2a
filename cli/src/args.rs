//! Command line arguments and option merging

use anyhow::{Context, Result};
use b64codec::CodecOptions;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Line width used when neither the command line nor the config sets one
pub const DEFAULT_WRAP: usize = 76;

#[derive(Parser, Debug, Default, PartialEq)]
#[command(
    name = "b64",
    version,
    about = "Base64 encode or decode FILE, or standard input, to standard output"
)]
pub struct Args {
    /// Decode data
    #[arg(short = 'd', long = "decode")]
    pub decode: bool,

    /// When decoding, ignore all ASCII whitespace
    #[arg(short = 'i', long = "ignore-garbage")]
    pub ignore_garbage: bool,

    /// Wrap encoded lines after COLS characters (default 76, 0 disables wrapping)
    #[arg(short = 'w', long = "wrap", value_name = "COLS")]
    pub wrap: Option<usize>,

    /// Path to a JSON file with codec options
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input file; standard input when absent or `-`
    #[arg(value_name = "FILE")]
    pub file: Option<String>,
}

impl Args {
    /// Whether input comes from standard input
    pub fn reads_stdin(&self) -> bool {
        matches!(self.file.as_deref(), None | Some("-"))
    }

    /// Build codec options: defaults, then the config file, then flags
    pub fn codec_options(&self) -> Result<CodecOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => CodecOptions::new(),
        };

        if let Some(width) = self.wrap {
            options.line_width = Some(width);
        } else if options.line_width.is_none() {
            options.line_width = Some(DEFAULT_WRAP);
        }
        if self.ignore_garbage {
            options.ignore_whitespace = true;
        }

        Ok(options)
    }
}

fn load_config(path: &Path) -> Result<CodecOptions> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}

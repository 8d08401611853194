//! Command-line definitions using clap

use clap::{Parser, ValueEnum};
use lea_harness::{FeatureProfile, StreamColors, DEFAULT_ENTRY_POINT};
use std::path::PathBuf;

/// Run one exported entry point of a WebAssembly test module
#[derive(Parser, Debug)]
#[command(name = "lea-harness")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the compiled test module (.wasm or .wat)
    pub module: PathBuf,

    /// Exported function to invoke
    #[arg(default_value = DEFAULT_ENTRY_POINT)]
    pub entry_point: String,

    /// Restrict the engine to a WebAssembly feature profile
    #[arg(long, value_enum, default_value_t = FeatureProfile::Default)]
    pub profile: FeatureProfile,

    /// When to colorize diagnostics
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolve the choice into per-stream colors
    ///
    /// `auto` checks stdout and stderr separately. `colored` is forced on
    /// whenever a stream wants color, since its own check only looks at stdout.
    pub fn apply(self) -> StreamColors {
        let colors = match self {
            ColorChoice::Auto => StreamColors::detect(),
            ColorChoice::Always => StreamColors::both(true),
            ColorChoice::Never => StreamColors::both(false),
        };
        if colors.out || colors.err {
            colored::control::set_override(true);
        }
        colors
    }
}

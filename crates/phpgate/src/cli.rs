use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Git pre-commit hook that runs phpcs and phpmd over the staged PHP files.
///
/// Git calls the hook without arguments; every flag here is optional.
#[derive(Parser, Debug)]
#[command(name = "phpgate", version, about)]
pub struct Cli {
    /// Read overrides from this file instead of the `config` file next to
    /// the executable
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print analyzer issues and errors
    #[arg(long)]
    pub quiet: bool,

    /// Color mode
    #[arg(long, default_value = "auto")]
    pub color: ColorMode,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

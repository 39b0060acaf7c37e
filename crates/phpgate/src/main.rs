mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, ColorMode};
use output::{OutputMode, Reporter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "PHPGATE_LOG";

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("phpgate=warn,phpgate_core=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    let mode = if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Human
    };
    let mut reporter = Reporter::new(mode);

    let code = commands::pre_commit::run_pre_commit_hook(cli.config.as_deref(), &mut reporter);

    std::process::exit(code);
}

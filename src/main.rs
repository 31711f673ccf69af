//! imgroot - rewrite image sources of a generated page to absolute URLs.
//!
//! Post-processing step for a static site build: given
//! `.../public/<subdir>/index.html`, every relative `<img src>` in that file
//! is replaced with `{base_url}<subdir>/<src>` and the file is rewritten.

mod cli;
mod config;
mod logger;
mod page;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::RewriteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = RewriteConfig::load(&cli)?;
    let report = page::process_page(&cli.path, &config, cli.dry_run)?;

    if cli.dry_run {
        log!("dry-run"; "{} was not modified", cli.path.display());
    }
    debug!("rewrite"; "{} images: {} rewritten, {} already absolute",
        report.total(), report.rewritten, report.absolute);
    Ok(())
}

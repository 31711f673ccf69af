//! Page processing: read, rewrite, write back.
//!
//! The page is only written once every image has been rewritten, so any
//! error leaves the file on disk untouched.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::{ImageRewriter, PageError, RewriteReport, Subdir};
use crate::config::RewriteConfig;
use crate::debug;
use crate::utils::{html::Document, source::SourceText};

/// Rewrite one page in place, or print it to stdout when `dry_run` is set.
pub fn process_page(path: &Path, config: &RewriteConfig, dry_run: bool) -> Result<RewriteReport> {
    let (html, report) = render_page(path, config)?;

    if dry_run {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.flush()?;
    } else {
        write_page(path, &html)?;
    }

    Ok(report)
}

/// Produce the rewritten document for a page without writing it.
pub fn render_page(path: &Path, config: &RewriteConfig) -> Result<(String, RewriteReport)> {
    // Path check comes first so a wrong argument never touches the filesystem.
    let subdir = Subdir::extract(path, config)?;
    debug!("route"; "{} -> {}", path.display(), subdir);

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;

    let source = SourceText::new(&source);
    let mut doc = Document::parse(&source).map_err(|e| PageError::Parse(format!("{e:?}")))?;
    let report = ImageRewriter::new(&config.base_url, &subdir).rewrite(&mut doc)?;

    Ok((doc.prettify(), report))
}

/// Overwrite the page. Not atomic: a failure mid-write can truncate it.
fn write_page(path: &Path, html: &str) -> Result<()> {
    fs::write(path, html).with_context(|| format!("failed to write `{}`", path.display()))
}

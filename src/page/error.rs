//! Page processing errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single page rewrite.
///
/// None of these are recovered from: the run stops and the page on disk is
/// left as it was.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("`{path}` is not a generated page (expected `.../{output_dir}/<subdir>/{index_file}`)")]
    UnexpectedPath {
        path: PathBuf,
        output_dir: String,
        index_file: String,
    },

    #[error("image #{index} has no `src` attribute")]
    MissingSrc { index: usize },

    #[error("image #{index}: `src` value too long to store")]
    AttributeTooLong { index: usize },

    #[error("invalid path pattern")]
    Pattern(#[from] regex::Error),

    #[error("failed to parse HTML: {0}")]
    Parse(String),
}

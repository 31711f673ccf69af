//! Page route - output path to published subdirectory.
//!
//! ```text
//! Output: site/public/2024/my-post/index.html
//!                     └─────┬────┘
//! Subdir:              2024/my-post
//! Published at:        {base_url}2024/my-post/
//! ```

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path};

use regex::Regex;

use super::PageError;
use crate::config::RewriteConfig;

/// Location of a page on the published site, relative to the host root.
///
/// Not validated: may be empty (`public//index.html`) or contain anything
/// that appeared in the output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdir(String);

impl Subdir {
    /// Extract the subdirectory from a generated page path.
    ///
    /// Matches `{output_dir}/(.*)/{index_file}` at the end of the path. The
    /// capture is greedy, so with several `{output_dir}/` components the
    /// first one is the output root.
    pub fn extract(path: &Path, config: &RewriteConfig) -> Result<Self, PageError> {
        let pattern = format!(
            "{}/(.*)/{}$",
            regex::escape(&config.output_dir),
            regex::escape(&config.index_file)
        );
        let re = Regex::new(&pattern)?;

        let normalized = normalize_separators(&path.to_string_lossy());

        re.captures(&normalized)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| PageError::UnexpectedPath {
                path: path.to_path_buf(),
                output_dir: config.output_dir.clone(),
                index_file: config.index_file.clone(),
            })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subdir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Use `/` as separator regardless of platform.
fn normalize_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

//! Rewrite configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! | Layer          | Source                                  |
//! |----------------|-----------------------------------------|
//! | defaults       | [`RewriteConfig::default`]              |
//! | config file    | `[rewrite]` table of `--config <FILE>`  |
//! | CLI flags      | `--base-url`                            |
//!
//! ```toml
//! [rewrite]
//! base_url = "https://www.cs.cmu.edu/~csd-phd-blog/"
//! output_dir = "public"
//! index_file = "index.html"
//! ```

mod error;

pub use error::{ConfigDiagnostic, ConfigError};

use crate::{cli::Cli, debug};
use serde::Deserialize;
use std::{fs, path::Path};

/// Publication host used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.cs.cmu.edu/~csd-phd-blog/";

/// Build output directory name that published paths are relative to.
pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// File name of a generated page inside its directory.
pub const DEFAULT_INDEX_FILE: &str = "index.html";

// ============================================================================
// root configuration
// ============================================================================

/// Layout of the config file on disk
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    rewrite: RewriteConfig,
}

/// Settings for one rewrite run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Absolute URL prefix that relative image sources are placed under.
    /// Always ends with `/` after [`RewriteConfig::finalize`].
    pub base_url: String,

    /// Name of the build output directory (`public` in `.../public/<subdir>/index.html`).
    pub output_dir: String,

    /// Page file name (`index.html` in `.../public/<subdir>/index.html`).
    pub index_file: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            index_file: DEFAULT_INDEX_FILE.into(),
        }
    }
}

impl RewriteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Reads the config file if one was given, applies CLI overrides,
    /// then normalizes and validates the result.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        if let Some(base_url) = &cli.base_url {
            config.base_url = base_url.clone();
        }

        config.finalize();
        config.validate()?;

        debug!("config"; "base_url: {}", config.base_url);
        Ok(config)
    }

    /// Parse the `[rewrite]` table of a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.rewrite)
    }

    /// Normalize values that have a single canonical form.
    fn finalize(&mut self) {
        self.base_url = self.base_url.trim().to_string();
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        self.output_dir = self.output_dir.trim_matches('/').to_string();
        self.index_file = self.index_file.trim_matches('/').to_string();
    }

    /// Validate configuration.
    ///
    /// # Checks
    /// - `base_url` is a valid URL with the `https` scheme and a host
    /// - `output_dir` and `index_file` are not empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        const URL_HINT: &str = "use format like https://example.com/blog/";

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            ConfigDiagnostic::new("rewrite.base_url", format!("invalid URL: {}", e))
                .with_hint(URL_HINT)
        })?;

        // Sources already starting with `https` are left alone, so a rewritten
        // source must start with it too or a second run would prefix it again.
        if parsed.scheme() != "https" {
            return Err(ConfigDiagnostic::new(
                "rewrite.base_url",
                format!("scheme '{}' not supported, must be https", parsed.scheme()),
            )
            .with_hint(URL_HINT)
            .into());
        }

        if parsed.host_str().is_none() {
            return Err(
                ConfigDiagnostic::new("rewrite.base_url", "URL must have a valid host")
                    .with_hint(URL_HINT)
                    .into(),
            );
        }

        if self.output_dir.is_empty() {
            return Err(ConfigDiagnostic::new("rewrite.output_dir", "must not be empty")
                .with_hint(format!("the default is \"{DEFAULT_OUTPUT_DIR}\""))
                .into());
        }

        if self.index_file.is_empty() {
            return Err(ConfigDiagnostic::new("rewrite.index_file", "must not be empty")
                .with_hint(format!("the default is \"{DEFAULT_INDEX_FILE}\""))
                .into());
        }

        Ok(())
    }
}

// ============================================================================
// tests
// ============================================================================

use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Limits applied to a single search session.
///
/// Every field has a default and each can be overridden independently,
/// from a YAML config file, from CLI flags, or in code. The limits
/// collectively bound worst-case work: enumeration is capped inside the
/// workspace layer, candidate count by `max_files_to_search`, per-file
/// cost by `max_file_size`, and result volume by `max_results` and
/// `max_matches_per_file`.
///
/// # Configuration Locations
///
/// 1. Custom config file passed via `--config`
/// 2. Local `.scour.yaml` in the current directory
/// 3. Global `$HOME/.config/scour/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// max_results: 100
/// max_matches_per_file: 20
/// max_files_to_search: 500
/// max_file_size: 1048576
/// batch_size: 16
/// ignore_patterns:
///   - "**/*.min.js"
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of distinct files with matches to retain.
    /// Scanning stops issuing reads once this many files have matched.
    #[serde(default = "default_max_results")]
    pub max_results: Option<usize>,

    /// Maximum matches kept per file; further occurrences in the same
    /// file are abandoned, even mid-line
    #[serde(default = "default_max_matches_per_file")]
    pub max_matches_per_file: Option<usize>,

    /// Maximum number of candidate files considered after filtering
    #[serde(default = "default_max_files_to_search")]
    pub max_files_to_search: Option<usize>,

    /// Files larger than this many bytes are skipped without being read
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Number of files read and scanned concurrently per wave
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Extra glob patterns to exclude, layered over the built-in set
    /// Examples:
    /// - "tmp/**": everything under tmp/
    /// - "**/*.min.js": all minified JS files
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Overrides the built-in binary extension set when present
    #[serde(default)]
    pub binary_extensions: Option<Vec<String>>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_results() -> Option<usize> {
    Some(100)
}

fn default_max_matches_per_file() -> Option<usize> {
    Some(20)
}

fn default_max_files_to_search() -> Option<usize> {
    Some(500)
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1 MiB
}

fn default_batch_size() -> usize {
    // Wave width bounds open file handles, not CPU use, so oversubscribe
    // the cores a little for IO-bound scans
    (num_cpus::get() * 4).clamp(8, 64)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_matches_per_file: default_max_matches_per_file(),
            max_files_to_search: default_max_files_to_search(),
            max_file_size: default_max_file_size(),
            batch_size: default_batch_size(),
            ignore_patterns: Vec::new(),
            binary_extensions: None,
            log_level: default_log_level(),
        }
    }
}

impl SearchOptions {
    /// Loads options from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads options from a specific file, falling back through the
    /// default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("scour/config.yaml")),
            // Local config
            Some(PathBuf::from(".scour.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Writes the options as YAML, used to seed a fresh `.scour.yaml`
    pub fn save(&self, path: &Path) -> SearchResult<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| SearchError::config_error(format!("Failed to serialize options: {e}")))?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Merges CLI arguments over file-loaded values. CLI values win
    /// wherever they differ from the defaults.
    pub fn merge_with_cli(mut self, cli: SearchOptions) -> Self {
        if cli.max_results != default_max_results() {
            self.max_results = cli.max_results;
        }
        if cli.max_matches_per_file != default_max_matches_per_file() {
            self.max_matches_per_file = cli.max_matches_per_file;
        }
        if cli.max_files_to_search != default_max_files_to_search() {
            self.max_files_to_search = cli.max_files_to_search;
        }
        if cli.max_file_size != default_max_file_size() {
            self.max_file_size = cli.max_file_size;
        }
        if cli.batch_size != default_batch_size() {
            self.batch_size = cli.batch_size;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if cli.binary_extensions.is_some() {
            self.binary_extensions = cli.binary_extensions;
        }
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }
}

use std::fs;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use serde::Deserialize;

use crate::error::{Error, Result};

/// How duplicate sets are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `Size: ... | BLAKE3: ...` blocks followed by indented paths
    #[default]
    Text,
    /// One JSON object per duplicate set, one per line
    Json,
}

/// Settings for a run.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change:
///
/// ```toml
/// glob = "*.jpg"
/// min_size = 4096
/// enable_symlinks = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Only file names matching this pattern are scanned.
    pub glob: String,
    /// Smallest file size considered, in bytes.
    pub min_size: u64,
    /// Largest file size considered, in bytes.
    pub max_size: u64,
    /// Follow symlinked directories and report symlinked files.
    #[serde(alias = "enable_symlinks")]
    pub include_symlinks: bool,
    pub verbose: bool,
    /// Hash worker count; derived from the CPU count when unset.
    pub threads: Option<usize>,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            glob: "*".to_string(),
            min_size: 1,
            max_size: u64::MAX,
            include_symlinks: false,
            verbose: false,
            threads: None,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Reads a TOML config file. Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks settings that would otherwise only fail part-way through a run.
    pub fn validate(&self) -> Result<()> {
        if self.min_size > self.max_size {
            return Err(Error::InvalidSizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidThreads);
        }
        self.glob_matcher()?;
        Ok(())
    }

    pub fn glob_matcher(&self) -> Result<GlobMatcher> {
        Glob::new(&self.glob)
            .map(|glob| glob.compile_matcher())
            .map_err(|source| Error::InvalidGlob {
                pattern: self.glob.clone(),
                source,
            })
    }

    /// Size filter applied to every scanned file (both bounds inclusive).
    pub fn size_in_range(&self, size: u64) -> bool {
        self.min_size <= size && size <= self.max_size
    }

    /// Number of hash workers for this run.
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(default_worker_count)
    }
}

/// Three quarters of the available cores, rounded, and never less than one.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    ((cpus as f64 * 0.75).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_all_files_from_one_byte() {
        let config = Config::default();
        assert_eq!(config.glob, "*");
        assert_eq!(config.min_size, 1);
        assert_eq!(config.max_size, u64::MAX);
        assert!(!config.include_symlinks);
        assert!(config.validate().is_ok());
        assert!(!config.size_in_range(0));
        assert!(config.size_in_range(1));
        assert!(config.size_in_range(u64::MAX));
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "glob = \"*.log\"\nenable_symlinks = true\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.glob, "*.log");
        assert!(config.include_symlinks);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.min_size, 1);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "colour = true").unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(&missing), Err(Error::ConfigRead { .. })));
    }

    #[test]
    fn validate_rejects_inverted_size_range() {
        let config = Config {
            min_size: 10,
            max_size: 5,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidSizeRange { min: 10, max: 5 })
        ));
    }

    #[test]
    fn validate_rejects_zero_threads_and_bad_glob() {
        let zero = Config {
            threads: Some(0),
            ..Config::default()
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidThreads)));

        let bad_glob = Config {
            glob: "a[".to_string(),
            ..Config::default()
        };
        assert!(matches!(bad_glob.validate(), Err(Error::InvalidGlob { .. })));
    }

    #[test]
    fn worker_count_prefers_explicit_threads() {
        let config = Config {
            threads: Some(3),
            ..Config::default()
        };
        assert_eq!(config.worker_count(), 3);
        assert!(default_worker_count() >= 1);
    }
}

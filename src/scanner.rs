use std::fmt::Display;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Result;

/// Identity of the underlying file a directory entry points at.
///
/// All hardlinks to one file share a `FileId`. On Unix this is the
/// (device, inode) pair, so equal inode numbers on different filesystems
/// stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId {
    pub device: u64,
    pub inode: u64,
}

impl FileId {
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// One regular file that passed the scan filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub size: u64,
    pub path: PathBuf,
    pub file_id: FileId,
}

/// Walks root directories and yields the files a run should consider.
pub struct Scanner<'a> {
    config: &'a Config,
    matcher: GlobMatcher,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            matcher: config.glob_matcher()?,
        })
    }

    /// Lazily yields a record for every regular file under `roots` whose
    /// name matches the glob and whose size is within the configured range.
    ///
    /// Symlinks are only followed (for directories) and reported (for files)
    /// when `include_symlinks` is set. Entries that cannot be read are
    /// skipped. The sequence is single-pass; scan again to start over.
    pub fn scan<'s>(&'s self, roots: &'s [PathBuf]) -> impl Iterator<Item = FileRecord> + 's {
        let mut synthetic_ids = 0u64;
        roots
            .iter()
            .filter(move |root| self.accept_root(root))
            .flat_map(move |root| {
                WalkDir::new(root)
                    .follow_links(self.config.include_symlinks)
                    .sort_by_file_name()
                    .into_iter()
            })
            .filter_map(move |entry| self.record_for(entry, &mut synthetic_ids))
    }

    fn accept_root(&self, root: &Path) -> bool {
        if root.is_dir() {
            true
        } else {
            warn!("Skipping '{}': not a directory", root.display());
            false
        }
    }

    fn record_for(&self, entry: walkdir::Result<DirEntry>, synthetic_ids: &mut u64) -> Option<FileRecord> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                self.report_skip(err);
                return None;
            }
        };

        // With links not followed, symlinks report their own type and drop out here.
        if !entry.file_type().is_file() || !self.matcher.is_match(entry.file_name()) {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                self.report_skip(err);
                return None;
            }
        };
        let size = metadata.len();
        if !self.config.size_in_range(size) {
            return None;
        }

        let file_id = FileId::from_metadata(&metadata).unwrap_or_else(|| {
            *synthetic_ids += 1;
            FileId {
                device: u64::MAX,
                inode: *synthetic_ids,
            }
        });
        debug!("Found '{}' ({} bytes)", entry.path().display(), size);

        Some(FileRecord {
            size,
            path: entry.into_path(),
            file_id,
        })
    }

    fn report_skip(&self, err: impl Display) {
        if self.config.verbose {
            warn!("Skipping entry: {err}");
        } else {
            debug!("Skipping entry: {err}");
        }
    }
}

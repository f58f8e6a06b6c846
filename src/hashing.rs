use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, error};
use rayon::prelude::*;

use crate::error::Result;
use crate::scanner::{FileId, FileRecord};

/// Name of the content digest, as printed in report headers.
pub const HASH_ALGORITHM: &str = "BLAKE3";

/// What a run learned about a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentId {
    /// BLAKE3 digest of the whole file.
    Digest([u8; 32]),
    /// Not hashed: every file of this size is a link to the same inode.
    SharedInode(FileId),
    /// The file could not be opened or read.
    Unreadable,
}

impl ContentId {
    /// Whether two files carrying this value may be reported as duplicates.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, ContentId::Unreadable)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Digest(bytes) => write!(f, "{}", blake3::Hash::from_bytes(*bytes).to_hex()),
            ContentId::SharedInode(id) => write!(f, "<INODE {}>", id.inode),
            ContentId::Unreadable => f.write_str("<UNREADABLE>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    pub content: ContentId,
    pub path: PathBuf,
}

/// Streams a file through BLAKE3. The file handle is closed on every return path.
pub fn hash_file(path: &Path) -> io::Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0; 64 * 1024];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(*hasher.finalize().as_bytes())
}

/// Hashes one path, turning a read failure into [`ContentId::Unreadable`].
pub fn hash_path(path: &Path) -> ContentId {
    match hash_file(path) {
        Ok(digest) => {
            debug!("Hashed '{}'", path.display());
            ContentId::Digest(digest)
        }
        Err(e) => {
            error!("Failed to hash '{}': {}", path.display(), e);
            ContentId::Unreadable
        }
    }
}

/// Fixed-size pool of hash workers, built once and reused for every batch.
///
/// Dropping the pool joins its threads.
pub struct HashPool {
    pool: rayon::ThreadPool,
}

impl HashPool {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("hash-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Hashes every record on the pool and blocks until all are done.
    ///
    /// Results come back in the same order as `records`.
    pub fn hash_batch(&self, records: Vec<FileRecord>) -> Vec<HashResult> {
        self.pool.install(|| {
            records
                .into_par_iter()
                .map(|record| HashResult {
                    content: hash_path(&record.path),
                    path: record.path,
                })
                .collect()
        })
    }
}

//! Decides how much hashing a size group actually needs.
//!
//! Paths that are hardlinks to one inode are byte-identical by construction,
//! so each inode is read at most once. Inodes with a single path are hashed
//! on the worker pool; inodes with several paths are hashed once inline and
//! the digest is copied to the other paths.

use std::ops::AddAssign;

use log::debug;

use crate::hashing::{hash_path, ContentId, HashPool, HashResult};
use crate::scanner::{FileId, FileRecord};
use crate::utils::{group_by_key, KeyOrder};

/// Hashes performed versus avoided through hardlink short-cuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashStats {
    pub computed: u64,
    pub skipped: u64,
}

impl AddAssign for HashStats {
    fn add_assign(&mut self, other: Self) {
        self.computed += other.computed;
        self.skipped += other.skipped;
    }
}

/// Records of one size group that share an inode.
pub type InodeGroup = (FileId, Vec<FileRecord>);

/// Splits a size group by inode. Every record lands in exactly one group.
pub fn partition_by_inode(records: Vec<FileRecord>) -> Vec<InodeGroup> {
    group_by_key(records, |r| r.file_id, KeyOrder::Descending)
}

/// Produces one [`HashResult`] per record of a size group.
///
/// Results from the pool (single-path inodes) come first in submission
/// order, followed by the hardlink sets.
pub fn schedule_group(records: Vec<FileRecord>, pool: &HashPool) -> (Vec<HashResult>, HashStats) {
    let mut stats = HashStats::default();

    if let Some(first) = records.first() {
        let shared = first.file_id;
        if records.iter().all(|r| r.file_id == shared) {
            stats.skipped = records.len() as u64;
            debug!(
                "All {} paths of {} bytes share inode {}; not hashing",
                records.len(),
                first.size,
                shared.inode
            );
            let results = records
                .into_iter()
                .map(|r| HashResult {
                    content: ContentId::SharedInode(shared),
                    path: r.path,
                })
                .collect();
            return (results, stats);
        }
    }

    let (unique, linked): (Vec<InodeGroup>, Vec<InodeGroup>) = partition_by_inode(records)
        .into_iter()
        .partition(|(_, members)| members.len() == 1);

    let singles: Vec<FileRecord> = unique.into_iter().flat_map(|(_, members)| members).collect();
    stats.computed += singles.len() as u64;
    let mut results = pool.hash_batch(singles);

    // Usually zero or one hardlink set per size group, so these run inline.
    for (_, members) in linked {
        let content = hash_path(&members[0].path);
        stats.computed += 1;
        stats.skipped += members.len() as u64 - 1;
        results.extend(members.into_iter().map(|r| HashResult { content, path: r.path }));
    }

    (results, stats)
}

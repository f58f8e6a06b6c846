use std::path::PathBuf;
use std::time::Duration;

use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::config::Config;
use crate::duplicates::{collect_duplicate_sets, count_paths, DuplicateSet};
use crate::error::{Error, Result};
use crate::hashing::HashPool;
use crate::scanner::{FileRecord, Scanner};
use crate::schedule::{schedule_group, HashStats};
use crate::utils::{group_by_key, KeyOrder};

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_scanned: u64,
    pub duplicate_sets: u64,
    pub duplicate_paths: u64,
    pub hashes: HashStats,
}

impl RunSummary {
    pub fn log(&self) {
        info!("Found      {} duplication sets", HumanCount(self.duplicate_sets));
        info!("Found      {} paths within sets", HumanCount(self.duplicate_paths));
        info!("Calculated {} hashes", HumanCount(self.hashes.computed));
        info!("Short-cut  {} hard links", HumanCount(self.hashes.skipped));
    }
}

/// Runs the scan, group, hash, and report pipeline.
///
/// Size groups are processed one at a time, largest size first. Only the
/// hashing inside a group runs on the worker pool.
pub struct DuplicateFinder {
    config: Config,
    pool: HashPool,
}

impl DuplicateFinder {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = HashPool::new(config.worker_count())?;
        debug!("Started {} hash workers", pool.workers());
        Ok(Self { config, pool })
    }

    /// Scans `roots` and hands every duplicate set to `on_set` as soon as its
    /// size group is done.
    pub fn run<F>(&self, roots: &[PathBuf], mut on_set: F) -> Result<RunSummary>
    where
        F: FnMut(&DuplicateSet) -> Result<()>,
    {
        if roots.is_empty() {
            return Err(Error::NoRoots);
        }

        let records = self.scan(roots)?;
        let mut summary = RunSummary {
            files_scanned: records.len() as u64,
            ..RunSummary::default()
        };

        for (size, group) in group_by_key(records, |r| r.size, KeyOrder::Descending) {
            if group.len() < 2 {
                continue;
            }
            debug!("Checking {} files of {} bytes", group.len(), size);
            let (results, stats) = schedule_group(group, &self.pool);
            summary.hashes += stats;

            let sets = collect_duplicate_sets(size, results);
            summary.duplicate_sets += sets.len() as u64;
            summary.duplicate_paths += count_paths(&sets) as u64;
            for set in &sets {
                on_set(set)?;
            }
        }

        Ok(summary)
    }

    /// Collects every duplicate set of a run.
    pub fn find_all(&self, roots: &[PathBuf]) -> Result<(Vec<DuplicateSet>, RunSummary)> {
        let mut sets = Vec::new();
        let summary = self.run(roots, |set| {
            sets.push(set.clone());
            Ok(())
        })?;
        Ok((sets, summary))
    }

    fn scan(&self, roots: &[PathBuf]) -> Result<Vec<FileRecord>> {
        let scanner = Scanner::new(&self.config)?;

        let spinner = if self.config.verbose {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        let records: Vec<FileRecord> = scanner
            .scan(roots)
            .inspect(|_| {
                spinner.inc(1);
                spinner.set_message(format!("Scanning files... {} found", HumanCount(spinner.position())));
            })
            .collect();
        spinner.finish_and_clear();

        info!("Looked up  {} file sizes", HumanCount(records.len() as u64));
        Ok(records)
    }
}

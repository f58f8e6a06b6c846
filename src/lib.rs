pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod finder;
pub mod hashing;
pub mod logging;
pub mod scanner;
pub mod schedule;
pub mod utils;

pub use cli::Cli;
pub use config::{Config, OutputFormat};
pub use duplicates::{collect_duplicate_sets, write_json, write_text, DuplicateSet, ReportedPath};
pub use error::{Error, Result};
pub use finder::{DuplicateFinder, RunSummary};
pub use hashing::{hash_file, ContentId, HashPool, HashResult, HASH_ALGORITHM};
pub use logging::init_logging;
pub use scanner::{FileId, FileRecord, Scanner};
pub use schedule::{partition_by_inode, schedule_group, HashStats};
pub use utils::{group_by_key, KeyOrder};

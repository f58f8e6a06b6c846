use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use log::debug;
use serde::{Serialize, Serializer};

use crate::hashing::{ContentId, HashResult, HASH_ALGORITHM};
use crate::utils::{group_by_key, KeyOrder};

/// A path in a duplicate set, with its link target when the path is a symlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedPath {
    #[serde(serialize_with = "lossy_path")]
    pub path: PathBuf,
    #[serde(serialize_with = "lossy_link_target")]
    pub link_target: Option<PathBuf>,
}

impl ReportedPath {
    /// Makes `path` absolute and lexically normalized (without resolving
    /// symlinks) and reads its link target if it is one. Only used for display.
    pub fn resolve(path: PathBuf) -> Self {
        let link_target = fs::symlink_metadata(&path)
            .ok()
            .filter(|meta| meta.file_type().is_symlink())
            .and_then(|_| fs::read_link(&path).ok());
        let path = std::path::absolute(&path).unwrap_or(path);
        Self {
            path: normalize_lexically(&path),
            link_target,
        }
    }
}

/// Drops `.` components and folds `name/..` pairs without touching the
/// filesystem. `..` directly under the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

// JSON strings must be UTF-8; names that are not are written lossily
// rather than failing the report.
fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

fn lossy_link_target<S: Serializer>(target: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error> {
    match target {
        Some(path) => serializer.serialize_some(&path.to_string_lossy()),
        None => serializer.serialize_none(),
    }
}

/// Two or more files with the same size and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    pub size: u64,
    pub content: ContentId,
    pub paths: Vec<ReportedPath>,
}

/// Regroups one size group's hash results by content and keeps every
/// content value shared by at least two paths.
///
/// Unreadable files are never grouped with each other.
pub fn collect_duplicate_sets(size: u64, results: Vec<HashResult>) -> Vec<DuplicateSet> {
    let comparable = results.into_iter().filter(|r| {
        if !r.content.is_comparable() {
            debug!("Leaving unreadable '{}' out of the report", r.path.display());
        }
        r.content.is_comparable()
    });

    group_by_key(comparable, |r| r.content, KeyOrder::Descending)
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(content, members)| {
            let mut paths: Vec<PathBuf> = members.into_iter().map(|r| r.path).collect();
            paths.sort();
            DuplicateSet {
                size,
                content,
                paths: paths.into_iter().map(ReportedPath::resolve).collect(),
            }
        })
        .collect()
}

/// Writes a set as a `Size: .. | BLAKE3: ..` header followed by one
/// indented line per path.
pub fn write_text(out: &mut impl Write, set: &DuplicateSet) -> io::Result<()> {
    writeln!(out, "Size: {} | {}: {}", set.size, HASH_ALGORITHM, set.content)?;
    for entry in &set.paths {
        match &entry.link_target {
            Some(target) => writeln!(out, "  {} -> {}", entry.path.display(), target.display())?,
            None => writeln!(out, "  {}", entry.path.display())?,
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonSet<'a> {
    size: u64,
    algorithm: &'static str,
    digest: String,
    paths: &'a [ReportedPath],
}

/// Writes a set as a single line of JSON.
pub fn write_json(out: &mut impl Write, set: &DuplicateSet) -> crate::Result<()> {
    let record = JsonSet {
        size: set.size,
        algorithm: HASH_ALGORITHM,
        digest: set.content.to_string(),
        paths: &set.paths,
    };
    serde_json::to_writer(&mut *out, &record)?;
    writeln!(out)?;
    Ok(())
}

/// Total number of paths across `sets`.
pub fn count_paths(sets: &[DuplicateSet]) -> usize {
    sets.iter().map(|set| set.paths.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileId;

    fn result(content: ContentId, path: &str) -> HashResult {
        HashResult {
            content,
            path: PathBuf::from(path),
        }
    }

    fn digest(data: &[u8]) -> ContentId {
        ContentId::Digest(*blake3::hash(data).as_bytes())
    }

    #[test]
    fn singletons_are_dropped() {
        let sets = collect_duplicate_sets(
            5,
            vec![
                result(digest(b"hello"), "/d/a.txt"),
                result(digest(b"world"), "/d/b.txt"),
            ],
        );
        assert!(sets.is_empty());
    }

    #[test]
    fn matching_digests_form_one_set() {
        let sets = collect_duplicate_sets(
            5,
            vec![
                result(digest(b"hello"), "/d/b.txt"),
                result(digest(b"world"), "/d/c.txt"),
                result(digest(b"hello"), "/d/a.txt"),
            ],
        );
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].size, 5);
        assert_eq!(sets[0].content, digest(b"hello"));
        let paths: Vec<&Path> = sets[0].paths.iter().map(|p| p.path.as_path()).collect();
        assert_eq!(paths, vec![Path::new("/d/a.txt"), Path::new("/d/b.txt")]);
        assert!(sets[0].paths.iter().all(|p| p.link_target.is_none()));
    }

    #[test]
    fn unreadable_files_never_pair_up() {
        let sets = collect_duplicate_sets(
            3,
            vec![
                result(ContentId::Unreadable, "/d/x"),
                result(ContentId::Unreadable, "/d/y"),
                result(digest(b"abc"), "/d/z"),
            ],
        );
        assert!(sets.is_empty());
    }

    #[test]
    fn shared_inode_results_are_reported() {
        let shared = ContentId::SharedInode(FileId { device: 1, inode: 77 });
        let sets = collect_duplicate_sets(
            5,
            vec![result(shared, "/d/a.txt"), result(shared, "/d/b.txt")],
        );
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].content.to_string(), "<INODE 77>");
    }

    #[test]
    fn relative_paths_are_made_absolute() {
        let sets = collect_duplicate_sets(
            1,
            vec![result(digest(b"a"), "rel/one"), result(digest(b"a"), "rel/two")],
        );
        assert!(sets[0].paths.iter().all(|p| p.path.is_absolute()));
        let cwd = std::env::current_dir().unwrap();
        assert!(sets[0].paths[0].path.starts_with(&cwd));
    }

    #[test]
    fn dot_components_are_folded_away() {
        assert_eq!(normalize_lexically(Path::new("/d/sub/../a.txt")), Path::new("/d/a.txt"));
        assert_eq!(normalize_lexically(Path::new("/d/./x/./y/../b")), Path::new("/d/x/b"));
        assert_eq!(normalize_lexically(Path::new("/../a")), Path::new("/a"));
        assert_eq!(normalize_lexically(Path::new("../a/../../b")), Path::new("../../b"));
    }

    #[test]
    fn parent_components_are_folded_when_resolving() {
        let sets = collect_duplicate_sets(
            1,
            vec![result(digest(b"a"), "/d/sub/../one"), result(digest(b"a"), "/d/./two")],
        );
        let paths: Vec<&Path> = sets[0].paths.iter().map(|p| p.path.as_path()).collect();
        assert_eq!(paths, vec![Path::new("/d/one"), Path::new("/d/two")]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_written_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let set = DuplicateSet {
            size: 5,
            content: digest(b"hello"),
            paths: vec![
                ReportedPath {
                    path: Path::new("/d").join(OsStr::from_bytes(b"bad\xff.txt")),
                    link_target: Some(PathBuf::from(OsStr::from_bytes(b"t\xfe"))),
                },
                ReportedPath {
                    path: PathBuf::from("/d/good.txt"),
                    link_target: None,
                },
            ],
        };

        let mut out = Vec::new();
        write_json(&mut out, &set).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["paths"][0]["path"], "/d/bad\u{fffd}.txt");
        assert_eq!(value["paths"][0]["link_target"], "t\u{fffd}");
        assert_eq!(value["paths"][1]["path"], "/d/good.txt");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_carry_their_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        fs::write(&real, b"hello").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let resolved = ReportedPath::resolve(link.clone());
        assert_eq!(resolved.path, link);
        assert_eq!(resolved.link_target, Some(real.clone()));
        assert_eq!(ReportedPath::resolve(real).link_target, None);
    }

    #[test]
    fn text_block_format() {
        let set = DuplicateSet {
            size: 5,
            content: ContentId::SharedInode(FileId { device: 1, inode: 9 }),
            paths: vec![
                ReportedPath {
                    path: PathBuf::from("/d/a.txt"),
                    link_target: None,
                },
                ReportedPath {
                    path: PathBuf::from("/d/b.txt"),
                    link_target: Some(PathBuf::from("a.txt")),
                },
            ],
        };

        let mut out = Vec::new();
        write_text(&mut out, &set).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Size: 5 | BLAKE3: <INODE 9>\n  /d/a.txt\n  /d/b.txt -> a.txt\n"
        );
    }

    #[test]
    fn json_line_format() {
        let set = DuplicateSet {
            size: 5,
            content: digest(b"hello"),
            paths: vec![
                ReportedPath {
                    path: PathBuf::from("/d/a.txt"),
                    link_target: None,
                },
                ReportedPath {
                    path: PathBuf::from("/d/b.txt"),
                    link_target: None,
                },
            ],
        };

        let mut out = Vec::new();
        write_json(&mut out, &set).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["size"], 5);
        assert_eq!(value["algorithm"], "BLAKE3");
        assert_eq!(value["digest"], blake3::hash(b"hello").to_hex().as_str());
        assert_eq!(value["paths"][1]["path"], "/d/b.txt");
        assert!(value["paths"][0]["link_target"].is_null());
        assert_eq!(count_paths(&[set]), 2);
    }
}

use glob::Pattern;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::errors::unify_path;
use crate::filters::should_exclude;

/// Hard cap on raw entries collected during one enumeration, before any
/// extension filtering. Bounds walk cost on huge trees.
pub const ENUMERATION_LIMIT: usize = 1000;

/// Deadline for one enumeration pass. An enumeration that overruns it is
/// cut short and whatever was collected so far is used; a partial
/// candidate set is not an error.
pub const ENUMERATION_DEADLINE: Duration = Duration::from_millis(1000);

/// The file-system capabilities the search engine consumes.
///
/// The engine never touches the file system directly; everything goes
/// through this trait so tests can substitute an in-memory double and
/// count stat/read calls.
pub trait Workspace: Send + Sync {
    /// Lists files under the workspace root, skipping paths that match any
    /// exclusion pattern, stopping at `limit` entries or at the deadline,
    /// whichever comes first. Enumeration order is stable for a fixed tree
    /// and becomes the final result order downstream.
    fn enumerate_files(
        &self,
        excludes: &[Pattern],
        limit: usize,
        deadline: Duration,
    ) -> Vec<PathBuf>;

    /// Size of the file in bytes
    fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Full file contents as raw bytes
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Best-effort root-relative rendering of `path`; falls back to the
    /// absolute path for files outside the root
    fn relative_path(&self, path: &Path) -> String;
}

/// Real workspace rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: unify_path(&root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Workspace for FsWorkspace {
    fn enumerate_files(
        &self,
        excludes: &[Pattern],
        limit: usize,
        deadline: Duration,
    ) -> Vec<PathBuf> {
        let started = Instant::now();
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        // The exclusion globs carry the skip rules; gitignore handling
        // stays off so results do not depend on repo state
        builder
            .hidden(false)
            .standard_filters(false)
            .sort_by_file_path(|a, b| a.cmp(b));

        for entry in builder.build() {
            if started.elapsed() > deadline {
                tracing::debug!(
                    "Enumeration deadline hit after {} entries, using partial set",
                    files.len()
                );
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                // Unreadable directories degrade to a partial listing
                Err(_) => continue,
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if should_exclude(relative, excludes) {
                continue;
            }
            files.push(entry.into_path());
            if files.len() >= limit {
                tracing::debug!("Enumeration limit of {} entries reached", limit);
                break;
            }
        }

        files
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        fs::metadata(path).map(|m| m.len())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn relative_path(&self, path: &Path) -> String {
        let unified = unify_path(path);
        match unified.strip_prefix(&self.root) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => unified.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::compile_excludes;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_enumerate_skips_excluded_dirs() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "src/main.rs", "fn main() {}\n");
        write_file(dir.path(), "node_modules/pkg/index.js", "x\n");
        write_file(dir.path(), "README.md", "readme\n");

        let ws = FsWorkspace::new(dir.path());
        let excludes = compile_excludes(&[]);
        let files = ws.enumerate_files(&excludes, ENUMERATION_LIMIT, ENUMERATION_DEADLINE);

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("node_modules")));
    }

    #[test]
    fn test_enumerate_respects_limit() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            write_file(dir.path(), &format!("file_{i}.txt"), "content\n");
        }

        let ws = FsWorkspace::new(dir.path());
        let files = ws.enumerate_files(&[], 4, ENUMERATION_DEADLINE);
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_enumerate_deadline_yields_partial_set() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            write_file(dir.path(), &format!("file_{i}.txt"), "content\n");
        }

        // An already-expired deadline cuts the walk short; whatever was
        // collected comes back without error
        let ws = FsWorkspace::new(dir.path());
        let files = ws.enumerate_files(&[], ENUMERATION_LIMIT, Duration::ZERO);
        assert!(files.len() < 10);
    }

    #[test]
    fn test_enumeration_order_is_stable() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "b.txt", "b\n");
        write_file(dir.path(), "a.txt", "a\n");
        write_file(dir.path(), "c.txt", "c\n");

        let ws = FsWorkspace::new(dir.path());
        let first = ws.enumerate_files(&[], ENUMERATION_LIMIT, ENUMERATION_DEADLINE);
        let second = ws.enumerate_files(&[], ENUMERATION_LIMIT, ENUMERATION_DEADLINE);
        assert_eq!(first, second);
    }

    #[test]
    fn test_relative_path_inside_and_outside_root() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "src/lib.rs", "x\n");

        let ws = FsWorkspace::new(dir.path());
        let inside = ws.relative_path(&dir.path().join("src/lib.rs"));
        assert_eq!(inside, "src/lib.rs");

        let outside = tempdir().unwrap();
        write_file(outside.path(), "elsewhere.txt", "x\n");
        let other = outside.path().join("elsewhere.txt");
        let rendered = ws.relative_path(&other);
        assert_eq!(rendered, unify_path(&other).to_string_lossy());
    }

    #[test]
    fn test_file_size_and_read() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "data.txt", "hello");

        let ws = FsWorkspace::new(dir.path());
        let path = dir.path().join("data.txt");
        assert_eq!(ws.file_size(&path).unwrap(), 5);
        assert_eq!(ws.read_file(&path).unwrap(), b"hello");

        let missing = dir.path().join("missing.txt");
        assert!(ws.file_size(&missing).is_err());
        assert!(ws.read_file(&missing).is_err());
    }
}

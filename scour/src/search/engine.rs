use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::matcher::QueryMatcher;
use super::selector::select_candidates;
use crate::config::SearchOptions;
use crate::errors::{SearchError, SearchResult};
use crate::results::{FileSearchResult, SearchMatch, SearchResults};
use crate::workspace::{FsWorkspace, Workspace};

/// The search engine: owns the workspace capability and the limits, and
/// performs one full scan per `search` call. No state is carried between
/// calls.
///
/// Candidates are processed in waves of `batch_size` files. Files within a
/// wave are scanned concurrently; waves are strictly sequential, which
/// bounds peak open file handles to the wave width and gives a natural
/// point to stop once `max_results` files have matched. Wave results are
/// merged in candidate order, never completion order, so output is
/// deterministic for a fixed tree and query.
pub struct SearchService {
    workspace: Arc<dyn Workspace>,
    options: SearchOptions,
}

impl SearchService {
    pub fn new(workspace: Arc<dyn Workspace>, options: SearchOptions) -> Self {
        Self { workspace, options }
    }

    /// Convenience constructor over the real file system
    pub fn with_root(root: impl Into<PathBuf>, options: SearchOptions) -> Self {
        Self::new(Arc::new(FsWorkspace::new(root)), options)
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    /// Runs one full search. Infallible by contract: enumeration shortfall
    /// and per-file failures all degrade to "contributes nothing".
    /// An empty query is defined as "no results", not an error.
    pub fn search(&self, query: &str) -> SearchResults {
        if query.is_empty() {
            return SearchResults::new();
        }

        let matcher = QueryMatcher::new(query);
        let candidates = select_candidates(self.workspace.as_ref(), &self.options);
        debug!(
            "Searching {} candidate files for '{}'",
            candidates.len(),
            query
        );

        let results = self.scan(&candidates, &matcher);
        info!(
            "Search complete: {} matches in {} of {} files scanned",
            results.total_matches, results.files_with_matches, results.files_scanned
        );
        results
    }

    /// Scans candidates in sequential waves of `batch_size` concurrent
    /// file scans, merging each wave in candidate order.
    fn scan(&self, candidates: &[PathBuf], matcher: &QueryMatcher) -> SearchResults {
        let mut results = SearchResults::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for wave in candidates.chunks(self.options.batch_size.max(1)) {
            // Early termination: once enough files matched, remaining
            // candidates are never read
            if self.at_result_cap(&results) {
                debug!(
                    "Result cap reached after {} files scanned, stopping",
                    results.files_scanned
                );
                break;
            }

            let scanned: Vec<SearchResult<Option<FileSearchResult>>> = wave
                .par_iter()
                .map(|path| self.scan_file(path, matcher))
                .collect();

            // The wave barrier: merge strictly in candidate order
            for (path, outcome) in wave.iter().zip(scanned) {
                results.files_scanned += 1;
                let file_result = match outcome {
                    Ok(Some(file_result)) => file_result,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };
                if self.at_result_cap(&results) {
                    continue;
                }
                // One entry per file path, first occurrence wins
                if seen.insert(file_result.file_path.clone()) {
                    results.add_file_result(file_result);
                }
            }
        }

        results
    }

    fn at_result_cap(&self, results: &SearchResults) -> bool {
        self.options
            .max_results
            .is_some_and(|cap| results.file_results.len() >= cap)
    }

    /// Scans one file. `Ok(None)` means the file was considered and
    /// contributed nothing (oversize, no occurrence); `Err` means stat or
    /// read failed and the caller should skip it.
    fn scan_file(
        &self,
        path: &Path,
        matcher: &QueryMatcher,
    ) -> SearchResult<Option<FileSearchResult>> {
        let size = self
            .workspace
            .file_size(path)
            .map_err(|e| SearchError::from_io(path, e))?;
        if size > self.options.max_file_size {
            trace!("Skipping oversize file ({} bytes): {}", size, path.display());
            return Ok(None);
        }

        let bytes = self
            .workspace
            .read_file(path)
            .map_err(|e| SearchError::from_io(path, e))?;
        // Best-effort decode: malformed sequences are replaced, never fatal
        let text = String::from_utf8_lossy(&bytes);

        // Fast reject on the whole content before any per-line work
        let text_lower = text.to_lowercase();
        if !matcher.content_may_match(&text_lower) {
            return Ok(None);
        }

        Ok(self.collect_matches(path, &text, matcher))
    }

    /// Extracts every occurrence per line, in line order then left to
    /// right, up to `max_matches_per_file` for the whole file.
    fn collect_matches(
        &self,
        path: &Path,
        text: &str,
        matcher: &QueryMatcher,
    ) -> Option<FileSearchResult> {
        let relative_path = self.workspace.relative_path(path);
        let cap = self.options.max_matches_per_file.unwrap_or(usize::MAX);
        let mut matches = Vec::new();

        'lines: for (index, line) in text.split('\n').enumerate() {
            for (column, _end) in matcher.find_in_line(line) {
                if matches.len() >= cap {
                    break 'lines;
                }
                matches.push(SearchMatch {
                    file_path: path.to_path_buf(),
                    relative_path: relative_path.clone(),
                    line: index + 1,
                    column,
                    text: line.trim().to_string(),
                });
            }
        }

        if matches.is_empty() {
            // Possible when the fast reject passed but occurrences
            // straddled a line boundary
            return None;
        }
        trace!("Found {} matches in {}", matches.len(), path.display());
        Some(FileSearchResult {
            file_path: path.to_path_buf(),
            relative_path,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn service(root: &Path, options: SearchOptions) -> SearchService {
        SearchService::with_root(root, options)
    }

    #[test]
    fn test_search_finds_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.txt"), "test line\ntest line 2\n").unwrap();

        let result = service(dir.path(), SearchOptions::default()).search("test");
        assert_eq!(result.files_with_matches, 1);
        assert_eq!(result.total_matches, 2);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.txt"), "anything\n").unwrap();

        let result = service(dir.path(), SearchOptions::default()).search("");
        assert!(result.is_empty());
        assert_eq!(result.files_scanned, 0);
    }

    #[test]
    fn test_multiple_matches_per_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("multi.txt"), "foo foo foo\n").unwrap();

        let result = service(dir.path(), SearchOptions::default()).search("foo");
        let matches = &result.file_results[0].matches;
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].column, 0);
        assert_eq!(matches[1].column, 4);
        assert_eq!(matches[2].column, 8);
        assert!(matches.iter().all(|m| m.line == 1));
    }

    #[test]
    fn test_match_cap_stops_mid_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("caps.txt"), "aa aa aa\naa aa\n").unwrap();

        let options = SearchOptions {
            max_matches_per_file: Some(1),
            ..Default::default()
        };
        let result = service(dir.path(), options).search("aa");
        let matches = &result.file_results[0].matches;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 1);
        assert_eq!(matches[0].column, 0);
    }

    #[test]
    fn test_oversize_file_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("big.txt"), "needle ".repeat(100)).unwrap();

        let options = SearchOptions {
            max_file_size: 16,
            ..Default::default()
        };
        let result = service(dir.path(), options).search("needle");
        assert!(result.is_empty());
        assert_eq!(result.files_scanned, 1);
    }

    #[test]
    fn test_line_trimmed_but_column_is_untrimmed_offset() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("indent.txt"), "    let x = 1;\n").unwrap();

        let result = service(dir.path(), SearchOptions::default()).search("let");
        let m = &result.file_results[0].matches[0];
        assert_eq!(m.text, "let x = 1;");
        assert_eq!(m.column, 4);
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let dir = tempdir().unwrap();
        let mut bytes = b"hello ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b" world\n");
        fs::write(dir.path().join("mixed.txt"), bytes).unwrap();

        let result = service(dir.path(), SearchOptions::default()).search("world");
        assert_eq!(result.total_matches, 1);
    }
}

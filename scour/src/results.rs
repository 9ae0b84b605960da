use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One located occurrence of the query within one line of one file.
///
/// Field names serialize in camelCase so results can be handed to a
/// front end as JSON without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// Absolute path of the file containing the match
    pub file_path: PathBuf,
    /// Path relative to the search root, or the absolute path when the
    /// file lies outside any known root
    pub relative_path: String,
    /// 1-based line number
    pub line: usize,
    /// 0-based byte column of the match start within the line
    pub column: usize,
    /// The full line containing the match, trimmed of surrounding whitespace
    pub text: String,
}

/// All matches found in a single file, in line order then left-to-right
/// within a line. Never constructed for a file with zero matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchResult {
    /// Absolute path of the file
    pub file_path: PathBuf,
    /// Relative path, copied from the file's first match
    pub relative_path: String,
    /// Ordered matches within the file
    pub matches: Vec<SearchMatch>,
}

/// Aggregated outcome of one search call: per-file results in scan order
/// plus bookkeeping counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Results per file, in the order files were scanned
    pub file_results: Vec<FileSearchResult>,
    /// Total number of matches across all files
    pub total_matches: usize,
    /// Number of candidate files actually scanned
    pub files_scanned: usize,
    /// Number of files that yielded at least one match
    pub files_with_matches: usize,
}

impl SearchResults {
    /// Creates a new empty result set
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a per-file result. Empty results are counted as scanned but
    /// contribute no entry.
    pub fn add_file_result(&mut self, file_result: FileSearchResult) {
        if file_result.matches.is_empty() {
            return;
        }
        self.total_matches += file_result.matches.len();
        self.files_with_matches += 1;
        self.file_results.push(file_result);
    }

    /// Flattens all matches into a single ordered list, the shape an
    /// interactive front end navigates over.
    pub fn all_matches(&self) -> impl Iterator<Item = &SearchMatch> {
        self.file_results.iter().flat_map(|f| f.matches.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.file_results.is_empty()
    }
}

use std::path::PathBuf;
use tracing::debug;

use crate::config::SearchOptions;
use crate::filters::{compile_excludes, default_binary_extensions, is_binary_extension};
use crate::workspace::{Workspace, ENUMERATION_DEADLINE, ENUMERATION_LIMIT};

/// Produces the candidate file list for one search: enumerate under the
/// exclusion globs, drop binary extensions, truncate to the candidate cap.
/// Order is enumeration order and is preserved all the way to the result.
pub fn select_candidates(workspace: &dyn Workspace, options: &SearchOptions) -> Vec<PathBuf> {
    let excludes = compile_excludes(&options.ignore_patterns);
    let binary_extensions = options
        .binary_extensions
        .clone()
        .unwrap_or_else(default_binary_extensions);

    let enumerated = workspace.enumerate_files(&excludes, ENUMERATION_LIMIT, ENUMERATION_DEADLINE);
    let enumerated_count = enumerated.len();

    let mut candidates: Vec<PathBuf> = enumerated
        .into_iter()
        .filter(|path| !is_binary_extension(path, &binary_extensions))
        .collect();

    if let Some(max_files) = options.max_files_to_search {
        candidates.truncate(max_files);
    }

    debug!(
        "Selected {} candidates from {} enumerated files",
        candidates.len(),
        enumerated_count
    );
    candidates
}

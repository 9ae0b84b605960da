use glob::Pattern;
use std::path::Path;
use tracing::warn;

/// Glob patterns excluded from every search. Dependency directories, build
/// output, and version-control metadata dominate enumeration cost on real
/// trees and never hold anything worth matching.
pub const EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/target/**",
    "**/.git/**",
    "**/.hg/**",
    "**/.svn/**",
    "**/dist/**",
    "**/build/**",
    "**/out/**",
    "**/.next/**",
    "**/.cache/**",
    "**/coverage/**",
    "**/vendor/**",
];

/// Extensions treated as binary and dropped before any content is read.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "obj", "o", "a", "lib", "class", "jar", "war", "png",
    "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svgz", "mp3", "mp4", "avi", "mov", "wav", "ogg",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "tar", "gz", "bz2", "xz", "7z",
    "rar", "woff", "woff2", "ttf", "eot", "otf", "pyc", "wasm", "db", "sqlite",
];

/// Compiles the built-in exclusion globs plus any user-supplied ones.
/// Invalid user patterns are warned about and dropped rather than failing
/// the search.
pub fn compile_excludes(extra: &[String]) -> Vec<Pattern> {
    EXCLUDE_PATTERNS
        .iter()
        .copied()
        .map(String::from)
        .chain(extra.iter().cloned())
        .filter_map(|p| match Pattern::new(&p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid exclude pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Checks if a path matches any exclusion pattern
pub fn should_exclude(path: &Path, excludes: &[Pattern]) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    excludes.iter().any(|p| p.matches(&normalized))
}

/// Checks whether the text after the final `.` names a binary extension.
/// Files with no extension are treated as text.
pub fn is_binary_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|b| b.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// The default binary extension set as owned strings, for callers that
/// allow overriding it.
pub fn default_binary_extensions() -> Vec<String> {
    BINARY_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

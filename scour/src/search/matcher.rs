use regex::{Regex, RegexBuilder};

/// Literal, case-insensitive matcher for one query string.
///
/// The query is escaped before compilation, so no character in it is ever
/// interpreted as pattern syntax; the regex engine is used purely as a
/// case-insensitive substring finder. A lowercased copy of the query backs
/// the whole-content fast reject, which is a plain `contains` and much
/// cheaper than running the finder over every line of a non-matching file.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query_lower: String,
    finder: Regex,
}

impl QueryMatcher {
    pub fn new(query: &str) -> Self {
        let finder = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .expect("escaped literal always compiles");
        Self {
            query_lower: query.to_lowercase(),
            finder,
        }
    }

    /// Whole-content pre-check: can this file possibly contain the query?
    /// `content_lower` must already be lowercased.
    pub fn content_may_match(&self, content_lower: &str) -> bool {
        content_lower.contains(&self.query_lower)
    }

    /// All non-overlapping occurrences in one line, left to right, as
    /// `(start, end)` byte offsets into the original-case line.
    pub fn find_in_line<'a>(&'a self, line: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.finder.find_iter(line).map(|m| (m.start(), m.end()))
    }
}

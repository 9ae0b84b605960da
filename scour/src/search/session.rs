use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::trace;

use super::engine::SearchService;
use crate::results::{FileSearchResult, SearchMatch};

/// Quiet period a front end should wait after the last keystroke before
/// submitting a query; each search is a fresh full scan, so firing on
/// every keystroke wastes a scan per character.
pub const DEBOUNCE: Duration = Duration::from_millis(75);

/// A request a front end sends to the engine. Serializes with a
/// `command` tag so the same type works over an RPC boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Search {
        text: String,
    },
    FetchFileContent {
        file_path: PathBuf,
    },
    OpenFile {
        file_path: PathBuf,
        line: usize,
        column: usize,
    },
    Close,
}

/// The engine's answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    SearchResults {
        results: Vec<FileSearchResult>,
    },
    FileContent {
        file_path: PathBuf,
        content: String,
    },
    /// Acknowledges an open request; actually opening the file is the
    /// host's job
    Opened {
        file_path: PathBuf,
        line: usize,
        column: usize,
    },
    Closed,
}

impl SearchService {
    /// Synchronous in-process dispatch of the request/response contract.
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Search { text } => Response::SearchResults {
                results: self.search(&text).file_results,
            },
            Request::FetchFileContent { file_path } => {
                // Same skip-on-error policy as scanning: an unreadable
                // file yields empty content, not an error
                let content = self
                    .workspace()
                    .read_file(&file_path)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default();
                Response::FileContent { file_path, content }
            }
            Request::OpenFile {
                file_path,
                line,
                column,
            } => Response::Opened {
                file_path,
                line,
                column,
            },
            Request::Close => Response::Closed,
        }
    }
}

/// Identifies one submitted query. A session only accepts results carrying
/// its latest token; anything older is stale and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryToken(u64);

/// Caller-side state for one interactive search surface: current query,
/// latest results, selection cursor, and the debounce/staleness
/// bookkeeping. Owned explicitly by the front end, never ambient, so two
/// panels can run sessions side by side.
pub struct SearchSession {
    service: SearchService,
    generation: u64,
    query: String,
    pending_since: Option<Instant>,
    results: Vec<FileSearchResult>,
    flat: Vec<SearchMatch>,
    selected: Option<usize>,
}

impl SearchSession {
    pub fn new(service: SearchService) -> Self {
        Self {
            service,
            generation: 0,
            query: String::new(),
            pending_since: None,
            results: Vec::new(),
            flat: Vec::new(),
            selected: None,
        }
    }

    pub fn service(&self) -> &SearchService {
        &self.service
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[FileSearchResult] {
        &self.results
    }

    pub fn match_count(&self) -> usize {
        self.flat.len()
    }

    /// Records a new query as typed. Bumps the generation so in-flight
    /// results for older queries will be rejected. An all-whitespace query
    /// clears the result list immediately; anything else starts the
    /// debounce clock.
    pub fn update_query(&mut self, text: &str, now: Instant) -> QueryToken {
        self.generation += 1;
        self.query = text.trim().to_string();

        if self.query.is_empty() {
            self.results.clear();
            self.flat.clear();
            self.selected = None;
            self.pending_since = None;
        } else {
            self.pending_since = Some(now);
        }
        QueryToken(self.generation)
    }

    /// The query due for submission, if the quiet period has elapsed.
    pub fn due_query(&self, now: Instant) -> Option<(QueryToken, String)> {
        let since = self.pending_since?;
        if now.duration_since(since) < DEBOUNCE {
            return None;
        }
        Some((QueryToken(self.generation), self.query.clone()))
    }

    /// Runs the pending query against the engine if its debounce has
    /// elapsed. Returns true when the result list was refreshed.
    pub fn run_pending(&mut self, now: Instant) -> bool {
        let Some((token, query)) = self.due_query(now) else {
            return false;
        };
        self.pending_since = None;
        let results = self.service.search(&query);
        self.accept(token, results.file_results)
    }

    /// Installs results for `token`. Results for anything but the latest
    /// submitted query are stale and dropped.
    pub fn accept(&mut self, token: QueryToken, results: Vec<FileSearchResult>) -> bool {
        if token.0 != self.generation {
            trace!(
                "Dropping stale results (token {} != generation {})",
                token.0,
                self.generation
            );
            return false;
        }
        self.flat = results
            .iter()
            .flat_map(|f| f.matches.iter().cloned())
            .collect();
        self.results = results;
        self.selected = if self.flat.is_empty() { None } else { Some(0) };
        true
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_match(&self) -> Option<&SearchMatch> {
        self.flat.get(self.selected?)
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            if i + 1 < self.flat.len() {
                self.selected = Some(i + 1);
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }
}

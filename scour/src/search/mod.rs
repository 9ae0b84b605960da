//! The search core: candidate selection, literal matching, the wave-based
//! scan engine, and the interactive session layer on top of it.

pub mod engine;
pub mod matcher;
pub mod selector;
pub mod session;

pub use engine::SearchService;
pub use matcher::QueryMatcher;
pub use selector::select_candidates;
pub use session::{Request, Response, SearchSession, DEBOUNCE};

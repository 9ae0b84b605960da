pub mod config;
pub mod errors;
pub mod filters;
pub mod results;
pub mod search;
pub mod workspace;

pub use config::SearchOptions;
pub use errors::{SearchError, SearchResult};
pub use results::{FileSearchResult, SearchMatch, SearchResults};
pub use search::{Request, Response, SearchService, SearchSession};
pub use workspace::{FsWorkspace, Workspace};

//! Source acquisition
//!
//! Listing, filtering and bounded parallel retrieval of source files from
//! GitHub or a local working tree.

pub mod fetcher;
pub mod filter;
pub mod github;
pub mod local;
pub mod scheduler;

pub use fetcher::{ContentFetcher, FailedFetch, FetchReport, decode_prefix, unit_from_bytes};
pub use filter::{PathSelection, select_paths, should_include_path};
pub use github::GithubClient;
pub use local::LocalSource;
pub use scheduler::run_bounded;

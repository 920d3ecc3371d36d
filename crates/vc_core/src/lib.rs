mod adapters;
pub mod resolver;
pub mod window;

pub use resolver::{CommitHistory, KeyDirectory, KeyImport, ResolveError, TrustResolver};
pub use window::{FetchWindow, FETCH_DEPTH_LIMIT, INITIAL_FETCH_DEPTH};

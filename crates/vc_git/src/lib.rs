pub mod commit;
pub mod fetch;
pub mod repository;

pub use commit::{parse_signature_log, SignatureStatus, SignedCommit};
pub use fetch::{fetch_jobs, FetchOutcome, FetchStep};
pub use repository::Repository;

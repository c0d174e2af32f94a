pub mod filter;
pub mod service;

pub use filter::{ObjectFilter, RESTRICTED_OBJECTS};
pub use service::{BackupOptions, BackupService, NO_TIMESTAMP_REASON};

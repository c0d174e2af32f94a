//! Incremental CSV backup of a CRM organisation.
//!
//! Every queryable object type is described, planned into a column list,
//! queried and streamed to `<Object>.csv`, with base64 fields decoded into
//! one file per record. See [`domains::backup::BackupService`] for the run
//! itself.

pub mod config;
pub mod domains;
pub mod errors;
pub mod session;
pub mod types;

pub use config::{BackupConfig, EmailConfig};
pub use domains::backup::{BackupOptions, BackupService, ObjectFilter};
pub use domains::report::{Reporter, RunSummary};
pub use errors::{BackupError, BackupResult};
pub use session::{Session, SoapSession};

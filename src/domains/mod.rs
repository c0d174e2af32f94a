pub mod backup;
pub mod catalog;
pub mod export;
pub mod report;

pub use backup::BackupService;
pub use catalog::SchemaCatalog;
pub use report::Reporter;

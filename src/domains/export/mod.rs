pub mod planner;
pub mod query;
pub mod service;
pub mod types;
pub mod writers;

pub use planner::plan;
pub use query::{compile, compile_plan, format_boundary, BOUNDARY_FORMAT};
pub use service::export_object;
pub use types::{ColumnPlan, ExportStats, TimestampField};
pub use writers::{BlobDirectory, StreamingCsvWriter};

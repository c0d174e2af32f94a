use chrono::{DateTime, FixedOffset};

use crate::domains::export::types::{ColumnPlan, TimestampField};

/// Boundary literal: millisecond precision with an explicit UTC offset,
/// e.g. `2024-01-02T03:04:05.678-0700`
pub const BOUNDARY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub fn format_boundary(boundary: &DateTime<FixedOffset>) -> String {
    boundary.format(BOUNDARY_FORMAT).to_string()
}

/// Build the query for one object.
///
/// Returns `None` when an incremental boundary is requested but the object
/// has no timestamp field to filter on; such objects are skipped entirely.
pub fn compile(
    object_name: &str,
    columns: &[String],
    blob_fields: &[String],
    since: Option<&DateTime<FixedOffset>>,
    timestamp_field: Option<TimestampField>,
) -> Option<String> {
    let select_list = columns
        .iter()
        .chain(blob_fields)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    let mut soql = format!("SELECT {} FROM {}", select_list, object_name);

    if let Some(boundary) = since {
        let field = timestamp_field?;
        soql.push_str(&format!(
            " WHERE {} >= {}",
            field.field_name(),
            format_boundary(boundary)
        ));
    }

    Some(soql)
}

pub fn compile_plan(plan: &ColumnPlan, since: Option<&DateTime<FixedOffset>>) -> Option<String> {
    compile(
        &plan.object_name,
        &plan.columns,
        &plan.blob_fields,
        since,
        plan.timestamp_field,
    )
}

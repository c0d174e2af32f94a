/// Timestamp fields usable for an incremental filter, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimestampField {
    SystemModstamp,
    LastModifiedDate,
    CreatedDate,
}

impl TimestampField {
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "SystemModstamp" => Some(TimestampField::SystemModstamp),
            "LastModifiedDate" => Some(TimestampField::LastModifiedDate),
            "CreatedDate" => Some(TimestampField::CreatedDate),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            TimestampField::SystemModstamp => "SystemModstamp",
            TimestampField::LastModifiedDate => "LastModifiedDate",
            TimestampField::CreatedDate => "CreatedDate",
        }
    }
}

/// Columns to select for one object type, derived from its describe metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    pub object_name: String,
    /// Plain fields and `Relationship.Field` columns. Also the CSV header and
    /// cell order.
    pub columns: Vec<String>,
    /// Base64 fields, written to one file per record instead of the CSV
    pub blob_fields: Vec<String>,
    /// Preferred field for an incremental filter, if the object has one
    pub timestamp_field: Option<TimestampField>,
    /// Lookup targets that were missing from the catalog
    pub unresolved_references: Vec<String>,
}

impl ColumnPlan {
    pub fn new(object_name: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn note_timestamp(&mut self, field: TimestampField) {
        self.timestamp_field = Some(match self.timestamp_field {
            Some(current) => current.min(field),
            None => field,
        });
    }
}

/// Counters for one completed object export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub records: usize,
    pub bytes_written: usize,
    pub blobs_written: usize,
}

pub mod service;
pub mod types;

pub use service::{SchemaCatalog, DESCRIBE_BATCH_SIZE};
pub use types::{FieldDescriptor, FieldType, ObjectDescriptor, ObjectSummary};

pub mod blob_writer;
pub mod csv_writer;

pub use blob_writer::BlobDirectory;
pub use csv_writer::StreamingCsvWriter;

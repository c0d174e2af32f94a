use std::path::Path;

use futures::StreamExt;
use log::{debug, warn};
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::domains::export::types::{ColumnPlan, ExportStats};
use crate::domains::export::writers::{BlobDirectory, StreamingCsvWriter};
use crate::errors::{ExportError, ExportResult};
use crate::session::Session;
use crate::types::{Record, Value};

/// Field carrying the record identifier used to name blob files
const RECORD_ID_FIELD: &str = "Id";

/// Run `soql` and stream its rows into `<output_dir>/<Object>.csv`, with
/// base64 fields decoded into `<output_dir>/<Object>.<Field>/<Id>`.
///
/// Rows keep the order the query delivers them in. Any error aborts the
/// object; output written before the error stays on disk.
pub async fn export_object<S: Session + ?Sized>(
    session: &S,
    soql: &str,
    plan: &ColumnPlan,
    output_dir: &Path,
) -> ExportResult<ExportStats> {
    let blob_dirs: Vec<BlobDirectory> = plan
        .blob_fields
        .iter()
        .map(|field| BlobDirectory::new(output_dir, &plan.object_name, field))
        .collect();
    for dir in &blob_dirs {
        dir.create().await?;
    }

    let csv_path = output_dir.join(format!("{}.csv", plan.object_name));
    let label = csv_path.display().to_string();
    let file = File::create(&csv_path)
        .await
        .map_err(|source| ExportError::CreateFile {
            path: label.clone(),
            source,
        })?;
    let mut writer = StreamingCsvWriter::new(BufWriter::new(file), &label, plan.columns.clone());

    let streamed = stream_rows(session, soql, &mut writer, &blob_dirs).await;

    // The file is flushed and closed on both paths; a streaming error wins
    // over a close error.
    match streamed {
        Ok(blobs_written) => {
            let mut stats = writer.finish().await?;
            stats.blobs_written = blobs_written;
            debug!(
                "{}: {} records, {} bytes, {} blobs",
                plan.object_name, stats.records, stats.bytes_written, stats.blobs_written
            );
            Ok(stats)
        }
        Err(e) => {
            if let Err(close_err) = writer.finish().await {
                warn!("{}: {}", plan.object_name, close_err);
            }
            Err(e)
        }
    }
}

async fn stream_rows<S: Session + ?Sized>(
    session: &S,
    soql: &str,
    writer: &mut StreamingCsvWriter<BufWriter<File>>,
    blob_dirs: &[BlobDirectory],
) -> ExportResult<usize> {
    writer.write_header().await?;

    let mut records = session.query(soql).await.map_err(ExportError::Query)?;
    let mut blobs_written = 0;

    while let Some(record) = records.next().await {
        let record = record.map_err(ExportError::Read)?;
        writer.write_record(&record).await?;
        blobs_written += write_blobs(&record, blob_dirs).await?;
    }

    Ok(blobs_written)
}

/// Write every non-null blob field of `record`; returns how many were written.
async fn write_blobs(record: &Record, blob_dirs: &[BlobDirectory]) -> ExportResult<usize> {
    let Some(id) = record.get(RECORD_ID_FIELD).filter(|v| !v.is_null()) else {
        return Ok(0);
    };
    let id = id.to_csv_string();

    let mut written = 0;
    for dir in blob_dirs {
        match record.get(dir.field()) {
            None | Some(Value::Null) => {}
            Some(value) => {
                dir.write(&id, &value.to_csv_string()).await?;
                written += 1;
            }
        }
    }
    Ok(written)
}

use std::io;
use std::mem;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::domains::export::types::ExportStats;
use crate::errors::{ExportError, ExportResult};
use crate::types::Record;

/// Encoded bytes held back before they are handed to the sink
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// Streaming CSV writer with a fixed column order.
///
/// Rows are encoded by one `csv::Writer` into memory and written to the async
/// sink in chunks of at least [`FLUSH_THRESHOLD`] bytes. Comma delimiter,
/// double-quote quoting and `\n` line endings.
pub struct StreamingCsvWriter<W: AsyncWrite + Unpin + Send> {
    inner: W,
    label: String,
    columns: Vec<String>,
    builder: csv::WriterBuilder,
    pending: csv::Writer<Vec<u8>>,
    stats: ExportStats,
}

impl<W: AsyncWrite + Unpin + Send> StreamingCsvWriter<W> {
    /// `label` names the destination in error messages.
    pub fn new(writer: W, label: &str, columns: Vec<String>) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder.terminator(csv::Terminator::Any(b'\n')).has_headers(false);
        let pending = builder.from_writer(Vec::with_capacity(FLUSH_THRESHOLD));

        Self {
            inner: writer,
            label: label.to_string(),
            columns,
            builder,
            pending,
            stats: ExportStats::default(),
        }
    }

    fn write_error(&self, source: io::Error) -> ExportError {
        ExportError::Write {
            path: self.label.clone(),
            source,
        }
    }

    async fn write_row<I, T>(&mut self, cells: I) -> ExportResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.pending
            .write_record(cells)
            .map_err(|e| self.write_error(e.into()))?;
        if self.pending.get_ref().len() >= FLUSH_THRESHOLD {
            self.drain().await?;
        }
        Ok(())
    }

    /// Hand every encoded byte to the sink.
    async fn drain(&mut self) -> ExportResult<()> {
        let fresh = self.builder.from_writer(Vec::with_capacity(FLUSH_THRESHOLD));
        let encoded = mem::replace(&mut self.pending, fresh)
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        if encoded.is_empty() {
            return Ok(());
        }

        self.inner
            .write_all(&encoded)
            .await
            .map_err(|e| self.write_error(e))?;
        self.stats.bytes_written += encoded.len();
        Ok(())
    }

    pub async fn write_header(&mut self) -> ExportResult<()> {
        let header = self.columns.clone();
        self.write_row(header.iter()).await
    }

    /// Write one row, taking each column's value from the record. Missing
    /// and null values become empty cells.
    pub async fn write_record(&mut self, record: &Record) -> ExportResult<()> {
        let row: Vec<String> = self
            .columns
            .iter()
            .map(|column| record.get(column).map(|v| v.to_csv_string()).unwrap_or_default())
            .collect();
        self.write_row(row.iter()).await?;
        self.stats.records += 1;
        Ok(())
    }

    /// Write out pending rows, then flush and close the sink.
    pub async fn finish(mut self) -> ExportResult<ExportStats> {
        self.drain().await?;

        let label = self.label.clone();
        self.inner
            .flush()
            .await
            .and(self.inner.shutdown().await)
            .map_err(|source| ExportError::Flush { path: label, source })?;
        Ok(self.stats)
    }
}

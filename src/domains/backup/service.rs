use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use log::{debug, info, warn};
use tokio::fs;

use crate::domains::backup::filter::ObjectFilter;
use crate::domains::catalog::{ObjectSummary, SchemaCatalog};
use crate::domains::export::{self, ExportStats};
use crate::domains::report::{Reporter, RunSummary};
use crate::errors::{BackupError, BackupResult, ExportError, ExportResult};
use crate::session::Session;

/// Reason given for objects that cannot take an incremental filter
pub const NO_TIMESTAMP_REASON: &str = "no timestamp field for incremental backup";

#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub output_dir: PathBuf,
    /// Incremental boundary; `None` backs up every record
    pub since: Option<DateTime<FixedOffset>>,
    pub filter: ObjectFilter,
}

/// Backs up every accepted object type, one at a time.
pub struct BackupService {
    session: Arc<dyn Session>,
    options: BackupOptions,
}

impl BackupService {
    pub fn new(session: Arc<dyn Session>, options: BackupOptions) -> Self {
        Self { session, options }
    }

    /// Run the backup and deliver the report.
    ///
    /// Errors before the first object (global describe, batched describe,
    /// output directory) are fatal: they are reported through
    /// [`Reporter::fatal`] and returned. Per-object failures only produce an
    /// error outcome.
    pub async fn run(&self, mut reporter: Reporter) -> BackupResult<RunSummary> {
        let started = Instant::now();

        let (summaries, catalog) = match self.prepare().await {
            Ok(prepared) => prepared,
            Err(e) => {
                reporter.fatal(&e.to_string()).await;
                return Err(e);
            }
        };

        for summary in summaries.iter().filter(|s| self.options.filter.accepts(s)) {
            self.backup_object(&summary.name, &catalog, &mut reporter).await;
        }

        let summary = reporter.finalize().await;
        info!(
            "Backup finished in {:.1}s: {} copied, {} failed, {} skipped, {} records",
            started.elapsed().as_secs_f64(),
            summary.successes(),
            summary.errors(),
            summary.skipped(),
            summary.total_records()
        );
        Ok(summary)
    }

    async fn prepare(&self) -> BackupResult<(Vec<ObjectSummary>, SchemaCatalog)> {
        let summaries = self
            .session
            .describe_global()
            .await
            .map_err(BackupError::DescribeGlobal)?;
        info!("{} object types visible", summaries.len());

        let catalog = SchemaCatalog::build(self.session.as_ref(), &summaries)
            .await
            .map_err(BackupError::Describe)?;

        fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|source| BackupError::OutputDir {
                path: self.options.output_dir.display().to_string(),
                source,
            })?;
        info!("Writing backup to {}", self.options.output_dir.display());

        Ok((summaries, catalog))
    }

    async fn backup_object(&self, name: &str, catalog: &SchemaCatalog, reporter: &mut Reporter) {
        match self.export(name, catalog).await {
            Ok(Some(stats)) => reporter.record_success(name, stats.records),
            Ok(None) => {
                debug!("{}: {}", name, NO_TIMESTAMP_REASON);
                reporter.record_skipped(name, NO_TIMESTAMP_REASON);
            }
            Err(e) => {
                warn!("{}: {}", name, e);
                reporter.record_error(name, e);
            }
        }
    }

    /// Export one object. `Ok(None)` means it was skipped without a query.
    async fn export(
        &self,
        name: &str,
        catalog: &SchemaCatalog,
    ) -> ExportResult<Option<ExportStats>> {
        let descriptor = catalog
            .lookup(name)
            .ok_or_else(|| ExportError::NotDescribed(name.to_string()))?;

        let plan = export::plan(descriptor, catalog);
        let Some(soql) = export::compile_plan(&plan, self.options.since.as_ref()) else {
            return Ok(None);
        };
        debug!("{}", soql);

        export::export_object(self.session.as_ref(), &soql, &plan, &self.options.output_dir)
            .await
            .map(Some)
    }
}

use std::fmt;

use log::{error, info};

use crate::config::EmailConfig;
use crate::domains::report::notifier::{Notifier, SmtpNotifier, StdoutNotifier};
use crate::domains::report::types::{OutcomeEntry, RunSummary};
use crate::errors::NotifyResult;

/// Collects one outcome per object and hands the finished report to a
/// [`Notifier`].
pub struct Reporter {
    notifier: Box<dyn Notifier>,
    entries: Vec<OutcomeEntry>,
}

impl Reporter {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            notifier,
            entries: Vec::new(),
        }
    }

    /// Email delivery when recipients are configured, console otherwise.
    /// An unusable email setup is an error here, before the run starts.
    pub fn from_config(email: Option<&EmailConfig>) -> NotifyResult<Self> {
        match email.filter(|e| e.enabled()) {
            Some(config) => {
                let notifier = SmtpNotifier::from_config(config)?;
                info!("Report will be emailed to {}", config.to.join(", "));
                Ok(Self::new(Box::new(notifier)))
            }
            None => Ok(Self::new(Box::new(StdoutNotifier))),
        }
    }

    fn record(&mut self, entry: OutcomeEntry) {
        self.notifier.line(&entry.detail_line());
        self.entries.push(entry);
    }

    pub fn record_success(&mut self, object_name: &str, records: usize) {
        self.record(OutcomeEntry::success(object_name, records));
    }

    pub fn record_error(&mut self, object_name: &str, message: impl fmt::Display) {
        self.record(OutcomeEntry::error(object_name, message));
    }

    pub fn record_skipped(&mut self, object_name: &str, reason: impl fmt::Display) {
        self.record(OutcomeEntry::skipped(object_name, reason));
    }

    /// Deliver the report. Delivery failures are logged and do not fail the run.
    pub async fn finalize(self) -> RunSummary {
        let summary = RunSummary::new(self.entries);
        if let Err(e) = self.notifier.deliver(&summary).await {
            error!("failed to send email: {}", e);
        }
        summary
    }

    /// Report a failure that prevents the run from starting.
    pub async fn fatal(&self, message: &str) {
        if let Err(e) = self.notifier.deliver_fatal(message).await {
            error!("failed to send email: {}", e);
        }
    }
}

use std::fmt;

/// How a single object's export ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Exported; carries the number of records written
    Success(usize),
    /// Aborted; carries the error message
    Error(String),
    /// Never queried; carries the reason
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEntry {
    pub object_name: String,
    pub status: OutcomeStatus,
}

impl OutcomeEntry {
    pub fn success(object_name: &str, records: usize) -> Self {
        Self {
            object_name: object_name.to_string(),
            status: OutcomeStatus::Success(records),
        }
    }

    pub fn error(object_name: &str, message: impl fmt::Display) -> Self {
        Self {
            object_name: object_name.to_string(),
            status: OutcomeStatus::Error(message.to_string()),
        }
    }

    pub fn skipped(object_name: &str, reason: impl fmt::Display) -> Self {
        Self {
            object_name: object_name.to_string(),
            status: OutcomeStatus::Skipped(reason.to_string()),
        }
    }

    /// One line of the report
    pub fn detail_line(&self) -> String {
        match &self.status {
            OutcomeStatus::Success(records) => {
                format!("{} - {} records", self.object_name, records)
            }
            OutcomeStatus::Error(message) => format!("{} - {}", self.object_name, message),
            OutcomeStatus::Skipped(reason) => format!("{} - skipped: {}", self.object_name, reason),
        }
    }
}

impl fmt::Display for OutcomeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail_line())
    }
}

/// Every outcome of a finished run, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub entries: Vec<OutcomeEntry>,
}

impl RunSummary {
    pub fn new(entries: Vec<OutcomeEntry>) -> Self {
        Self { entries }
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    pub fn successes(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Success(_)))
    }

    pub fn errors(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Error(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped(_)))
    }

    pub fn total_records(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e.status {
                OutcomeStatus::Success(records) => records,
                _ => 0,
            })
            .sum()
    }

    /// Closing line for console output
    pub fn total_line(&self) -> String {
        format!(
            "Total: {} objects copied, {} objects failed, {} objects skipped",
            self.successes(),
            self.errors(),
            self.skipped()
        )
    }

    /// Body of the completion email
    pub fn message_body(&self) -> String {
        let mut body = format!(
            "Backup finished with {} objects backed up and {} objects failed.\n",
            self.successes(),
            self.errors()
        );
        body.push_str("Detailed report below:\n");
        for entry in &self.entries {
            body.push_str(&entry.detail_line());
            body.push('\n');
        }
        body
    }
}

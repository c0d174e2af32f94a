use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::domains::catalog::{ObjectDescriptor, ObjectSummary};
use crate::errors::{SessionError, SessionResult};
use crate::session::{RecordStream, Session};
use crate::types::Record;

enum QueryResult {
    Records(Vec<Record>),
    Fail(String),
    FailAfter(Vec<Record>, String),
}

/// In-memory session for tests
pub struct MockSession {
    descriptors: Vec<ObjectDescriptor>,
    results: HashMap<String, QueryResult>,
    global_fault: Option<String>,
    describe_fault: Option<String>,
    describe_batches: Mutex<Vec<usize>>,
    queries: Mutex<Vec<String>>,
}

fn fault(message: &str) -> SessionError {
    SessionError::Fault {
        code: "sf:MOCK".to_string(),
        message: message.to_string(),
    }
}

/// Object name following the FROM keyword
fn queried_object(soql: &str) -> String {
    soql.split(" FROM ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or_default()
        .to_lowercase()
}

impl MockSession {
    pub fn new(descriptors: Vec<ObjectDescriptor>) -> Self {
        Self {
            descriptors,
            results: HashMap::new(),
            global_fault: None,
            describe_fault: None,
            describe_batches: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(mut self, object: &str, records: Vec<Record>) -> Self {
        self.results
            .insert(object.to_lowercase(), QueryResult::Records(records));
        self
    }

    pub fn fail_query(mut self, object: &str, message: &str) -> Self {
        self.results
            .insert(object.to_lowercase(), QueryResult::Fail(message.to_string()));
        self
    }

    pub fn fail_after(mut self, object: &str, records: Vec<Record>, message: &str) -> Self {
        self.results.insert(
            object.to_lowercase(),
            QueryResult::FailAfter(records, message.to_string()),
        );
        self
    }

    pub fn fail_global(mut self, message: &str) -> Self {
        self.global_fault = Some(message.to_string());
        self
    }

    pub fn fail_describe(mut self, message: &str) -> Self {
        self.describe_fault = Some(message.to_string());
        self
    }

    pub fn summaries(&self) -> Vec<ObjectSummary> {
        self.descriptors.iter().map(ObjectDescriptor::summary).collect()
    }

    pub fn describe_batch_sizes(&self) -> Vec<usize> {
        self.describe_batches.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn describe_global(&self) -> SessionResult<Vec<ObjectSummary>> {
        match &self.global_fault {
            Some(message) => Err(fault(message)),
            None => Ok(self.summaries()),
        }
    }

    async fn describe_sobjects(&self, names: &[String]) -> SessionResult<Vec<ObjectDescriptor>> {
        if let Some(message) = &self.describe_fault {
            return Err(fault(message));
        }
        self.describe_batches.lock().unwrap().push(names.len());

        Ok(self
            .descriptors
            .iter()
            .filter(|d| names.iter().any(|n| n.eq_ignore_ascii_case(&d.name)))
            .cloned()
            .collect())
    }

    async fn query<'a>(&'a self, soql: &str) -> SessionResult<RecordStream<'a>> {
        self.queries.lock().unwrap().push(soql.to_string());

        let result = self.results.get(&queried_object(soql));
        let items: Vec<Result<Record, SessionError>> = match result {
            None => Vec::new(),
            Some(QueryResult::Records(records)) => records.iter().cloned().map(Ok).collect(),
            Some(QueryResult::Fail(message)) => return Err(fault(message)),
            Some(QueryResult::FailAfter(records, message)) => records
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(fault(message))))
                .collect(),
        };

        Ok(Box::pin(stream::iter(items)))
    }
}

//! Connection to the remote CRM API.
//!
//! The exporter only needs three calls: the global describe, a batched
//! per-object describe and a query whose rows arrive as a lazy stream.
//! [`SoapSession`] implements them over the partner SOAP API.

mod envelope;
mod pager;
mod soap;

#[cfg(test)]
pub mod mock;

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::domains::catalog::{ObjectDescriptor, ObjectSummary};
use crate::errors::{SessionError, SessionResult};
use crate::types::Record;

pub use soap::{SoapSession, DEFAULT_API_VERSION};

/// Query rows in delivery order. Pages are fetched as the stream is polled.
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<Record, SessionError>> + Send + 'a>>;

/// Authenticated API session
#[async_trait]
pub trait Session: Send + Sync {
    /// List every object type visible to the session
    async fn describe_global(&self) -> SessionResult<Vec<ObjectSummary>>;

    /// Describe up to 100 object types in one call
    async fn describe_sobjects(&self, names: &[String]) -> SessionResult<Vec<ObjectDescriptor>>;

    /// Execute a query. Execution errors are returned here; errors while
    /// reading later pages surface as items of the stream.
    async fn query<'a>(&'a self, soql: &str) -> SessionResult<RecordStream<'a>>;
}

pub mod notifier;
pub mod service;
pub mod types;

pub use notifier::{Notifier, SmtpNotifier, StdoutNotifier};
pub use service::Reporter;
pub use types::{OutcomeEntry, OutcomeStatus, RunSummary};

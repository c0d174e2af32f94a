use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::debug;

use crate::config::EmailConfig;
use crate::domains::report::types::RunSummary;
use crate::errors::{NotifyError, NotifyResult};

/// Display name on outgoing mail
pub const SENDER_NAME: &str = "salesforce.com backup";
pub const COMPLETED_SUBJECT: &str = "salesforce.com backup completed";
pub const FATAL_SUBJECT: &str = "Fatal failure in salesforce.com backup";

/// Delivery channel for the run report
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Called for each outcome as soon as it is recorded
    fn line(&self, _line: &str) {}

    /// Deliver the report of a completed run
    async fn deliver(&self, summary: &RunSummary) -> NotifyResult<()>;

    /// Deliver notice of a run that failed before processing any object
    async fn deliver_fatal(&self, message: &str) -> NotifyResult<()>;
}

/// Prints report lines as they arrive and a total at the end
#[derive(Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    fn line(&self, line: &str) {
        println!("{}", line);
    }

    async fn deliver(&self, summary: &RunSummary) -> NotifyResult<()> {
        println!("{}", summary.total_line());
        Ok(())
    }

    async fn deliver_fatal(&self, _message: &str) -> NotifyResult<()> {
        Ok(())
    }
}

/// Sends the report as one plain-text email over implicit TLS
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_address(address: &str) -> NotifyResult<Address> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl SmtpNotifier {
    pub fn from_config(config: &EmailConfig) -> NotifyResult<Self> {
        let (host, port) = config.server_address()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .authentication(vec![Mechanism::Plain])
            .build();

        let from = Mailbox::new(Some(SENDER_NAME.to_string()), parse_address(&config.from)?);
        let to = config
            .to
            .iter()
            .map(|address| parse_address(address).map(|a| Mailbox::new(None, a)))
            .collect::<NotifyResult<Vec<_>>>()?;

        Ok(Self { transport, from, to })
    }

    fn build_message(&self, subject: &str, body: String) -> NotifyResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(body)
            .map_err(|e| NotifyError::Message(e.to_string()))
    }

    async fn send(&self, subject: &str, body: String) -> NotifyResult<()> {
        let message = self.build_message(subject, body)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        debug!("Email '{}' accepted: {:?}", subject, response.code());
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn deliver(&self, summary: &RunSummary) -> NotifyResult<()> {
        self.send(COMPLETED_SUBJECT, summary.message_body()).await
    }

    async fn deliver_fatal(&self, message: &str) -> NotifyResult<()> {
        self.send(FATAL_SUBJECT, format!("Backup failed to start: {}\n", message))
            .await
    }
}

/// Captures notifications in memory
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub events: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) -> NotifyResult<()> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    fn line(&self, line: &str) {
        self.events.lock().unwrap().push(format!("line: {}", line));
    }

    async fn deliver(&self, summary: &RunSummary) -> NotifyResult<()> {
        self.push(format!("deliver: {}", summary.total_line()))
    }

    async fn deliver_fatal(&self, message: &str) -> NotifyResult<()> {
        self.push(format!("fatal: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::report::types::OutcomeEntry;

    fn email_config() -> EmailConfig {
        EmailConfig {
            server: "smtp.example.com:465".to_string(),
            user: "backup@example.com".to_string(),
            password: "secret".to_string(),
            from: "backup@example.com".to_string(),
            to: vec!["ops@example.com".to_string(), "admin@example.com".to_string()],
        }
    }

    #[test]
    fn test_completed_message() {
        let notifier = SmtpNotifier::from_config(&email_config()).unwrap();
        let summary = RunSummary::new(vec![OutcomeEntry::success("Account", 3)]);

        let message = notifier
            .build_message(COMPLETED_SUBJECT, summary.message_body())
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: salesforce.com backup completed"));
        assert!(raw.contains("salesforce.com backup"));
        assert!(raw.contains("<backup@example.com>"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("admin@example.com"));
        assert!(raw.contains("Account - 3 records"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut config = email_config();
        config.to.push("not an address".to_string());

        let err = SmtpNotifier::from_config(&config).err().unwrap();
        assert!(matches!(err, NotifyError::Address { .. }));
    }

    #[test]
    fn test_invalid_server() {
        let mut config = email_config();
        config.server = "smtp.example.com".to_string();

        let err = SmtpNotifier::from_config(&config).err().unwrap();
        assert!(matches!(err, NotifyError::Config(_)));
    }
}

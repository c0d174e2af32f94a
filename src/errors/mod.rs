mod error;

pub use error::{BackupError, ConfigError, ExportError, NotifyError, SessionError};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for calls against the remote API
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for a single object's export
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for notification delivery
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Result type for the run as a whole; errors here are fatal
pub type BackupResult<T> = Result<T, BackupError>;

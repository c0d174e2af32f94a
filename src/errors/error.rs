use std::io;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot open config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("error parsing config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to create new config file {path}: {source}")]
    Sample {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse email server '{server}': {reason}")]
    EmailServer { server: String, reason: String },

    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("hours {hours} reaches past the earliest representable date")]
    Hours { hours: i64 },
}

impl ConfigError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }
}

/// Errors raised by the remote API client
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{code}: {message}")]
    Fault { code: String, message: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),
}

impl SessionError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Errors that abort one object's export without stopping the run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("object not described: {0}")]
    NotDescribed(String),

    #[error("query failed: {0}")]
    Query(#[source] SessionError),

    #[error("failed to read record: {0}")]
    Read(#[source] SessionError),

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create file {path}: {source}")]
    CreateFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("write to file failed {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush file {path}: {source}")]
    Flush {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("record id '{id}' cannot be used as a file name for {object}.{field}")]
    InvalidRecordId {
        object: String,
        field: String,
        id: String,
    },

    #[error("error decoding base64 field {object}.{field} error: {source}")]
    Decode {
        object: String,
        field: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("failed to write base64 field {object}.{field} error: {source}")]
    BlobWrite {
        object: String,
        field: String,
        #[source]
        source: io::Error,
    },
}

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build email: {0}")]
    Message(String),

    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Errors that stop the run before any object is processed
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification setup failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("login failed: {0}")]
    Login(#[source] SessionError),

    #[error("failed to describe global: {0}")]
    DescribeGlobal(#[source] SessionError),

    #[error("failed to describe sobjects: {0}")]
    Describe(#[source] SessionError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: io::Error,
    },
}

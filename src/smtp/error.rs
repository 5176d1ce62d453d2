//! Error types for the SMTP server

use crate::smtp::address::Address;
use crate::smtp::response::codes;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized command: {0}")]
    InvalidCommand(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("Invalid state for command: {0}")]
    InvalidState(String),

    #[error("No valid recipients")]
    NoValidRecipients,

    #[error("Mailbox not found: {0}")]
    MailboxNotFound(Address),

    #[error("Mail store error: {0}")]
    Store(#[from] StoreError),

    #[error("Delivery queue closed")]
    QueueClosed,
}

/// Maps SMTP errors to appropriate response codes
impl SmtpError {
    pub fn to_response_code(&self) -> u16 {
        match self {
            SmtpError::Io(_) => codes::SERVICE_UNAVAILABLE,
            SmtpError::InvalidCommand(_) => codes::SYNTAX_ERROR,
            SmtpError::InvalidSyntax(_) => codes::SYNTAX_ERROR,
            SmtpError::InvalidState(_) => codes::OUT_OF_SEQUENCE,
            SmtpError::NoValidRecipients => codes::NO_VALID_RECIPIENTS,
            SmtpError::MailboxNotFound(_) => codes::MAILBOX_NOT_FOUND,
            SmtpError::Store(_) => codes::LOCAL_ERROR,
            SmtpError::QueueClosed => codes::LOCAL_ERROR,
        }
    }

    pub fn to_response_message(&self) -> String {
        match self {
            SmtpError::Io(_) => "Service not available".to_string(),
            SmtpError::InvalidCommand(verb) => format!("Unrecognized command: {verb}"),
            SmtpError::InvalidSyntax(msg) => format!("Syntax error: {msg}"),
            SmtpError::InvalidState(msg) => format!("Bad sequence of commands: {msg}"),
            SmtpError::NoValidRecipients => "No valid recipients".to_string(),
            SmtpError::MailboxNotFound(addr) => format!("Can't find mailbox {addr}"),
            SmtpError::Store(_) | SmtpError::QueueClosed => {
                "Requested action aborted: local error in processing".to_string()
            }
        }
    }
}

/// Failures reported by a mail store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mail store lock poisoned")]
    Poisoned,

    #[error("mail store backend failure: {0}")]
    Backend(String),
}

/// Failures while loading the server configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

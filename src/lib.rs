//! # maildrop
//!
//! maildrop is a minimal SMTP server that delivers into local mailboxes.
//!
//! Each connection runs on its own thread. Completed messages go through a
//! bounded delivery queue to a single worker that stores them, so sessions
//! never write to the mail store directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maildrop::{Address, MailStore, MemoryStore, ServerConfig, SmtpServer};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let config = ServerConfig {
//!     mailboxes: vec!["recipient".to_string()],
//!     ..ServerConfig::default()
//! };
//! let store = Arc::new(MemoryStore::new());
//! let server = SmtpServer::new(config, store.clone()).unwrap();
//!
//! thread::spawn(move || server.start().unwrap());
//!
//! // Clients deliver to 127.0.0.1:2525 ...
//!
//! let inbox = store
//!     .list_mail(&Address::new("recipient", "localhost"))
//!     .unwrap();
//! for message in inbox {
//!     println!("{} from {}", message.subject, message.from);
//! }
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the client
//! - `MAIL FROM` - Start a transaction
//! - `RCPT TO` - Add a recipient (multiple recipients are supported)
//! - `DATA` - Send the message
//! - `RSET` - Abort the current transaction
//! - `VRFY` - Check whether an address has a mailbox
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## Notes
//!
//! - Mail is accepted only for registered addresses; `Postmaster@<domain>`
//!   always is.
//! - Unknown commands are answered with `500` and the session continues.
//! - Authentication, TLS and relaying are not supported.

pub mod config;
mod smtp;
pub mod store;

pub use config::ServerConfig;
pub use smtp::{
    Address, ConfigError, DeliveryQueue, DeliveryWorker, Message, SmtpError, SmtpResponse,
    SmtpServer, SmtpSession, SmtpState, StoreError,
};
pub use store::{Delivery, MailStore, MailboxId, MemoryStore};

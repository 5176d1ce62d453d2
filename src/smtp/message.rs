//! Message (envelope) data structures

use crate::smtp::address::Address;
use std::time::SystemTime;

/// A message accepted by the server.
///
/// Sessions build one up while a transaction is in progress; once handed to
/// the delivery queue it is never modified again.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The sender, from `MAIL FROM` or a `From:` header
    pub from: Address,

    /// Recipients, from `RCPT TO` or a `To:` header
    pub to: Vec<Address>,

    /// Value of the `Subject:` header, empty when absent
    pub subject: String,

    /// Body lines, each terminated with CRLF
    pub body: String,

    /// When the DATA phase completed
    pub received_at: SystemTime,
}

impl Message {
    /// Start a new message from a sender
    pub fn new(from: Address) -> Self {
        Self {
            from,
            to: Vec::new(),
            subject: String::new(),
            body: String::new(),
            received_at: SystemTime::now(),
        }
    }

    /// Add a recipient unless it is already present
    pub fn add_recipient(&mut self, recipient: Address) {
        if !self.has_recipient(&recipient) {
            self.to.push(recipient);
        }
    }

    /// Check if this message is addressed to a specific recipient
    pub fn has_recipient(&self, recipient: &Address) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    /// Append one body line, terminating it with CRLF
    pub fn push_body_line(&mut self, line: &str) {
        self.body.push_str(line);
        self.body.push_str("\r\n");
    }

    /// Size of the body in bytes
    pub fn body_size(&self) -> usize {
        self.body.len()
    }
}

//! SMTP session state management

use crate::smtp::address::Address;
use crate::smtp::error::SmtpError;
use crate::smtp::message::Message;

/// Represents the current state of an SMTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Initial state - waiting for HELO/EHLO
    Start,
    /// HELO/EHLO received - ready for MAIL command
    Identified,
    /// MAIL FROM received - ready for RCPT commands
    SenderSet,
    /// At least one recipient accepted - ready for DATA or more RCPT commands
    RecipientsSet,
    /// DATA accepted - collecting message lines
    InTransaction,
    /// QUIT received - no further commands are read
    Closed,
}

/// Manages the state and data for a single SMTP session
#[derive(Debug)]
pub struct SmtpSession {
    /// Current state of the session
    pub state: SmtpState,
    /// Whether the client greeted with EHLO
    pub extended: bool,
    /// Identity declared by HELO/EHLO
    pub client_identity: Option<String>,
    /// Message being assembled, present from MAIL FROM until completion
    pub message: Option<Message>,
    /// Recipients refused during the current transaction
    pub rejected_recipients: usize,
    /// Still reading the header block of the DATA phase
    in_headers: bool,
    /// Last header applied in the header block, extended by folded lines
    unfolding: Option<(HeaderField, String)>,
}

impl SmtpSession {
    /// Create a new SMTP session
    pub fn new() -> Self {
        Self {
            state: SmtpState::Start,
            extended: false,
            client_identity: None,
            message: None,
            rejected_recipients: 0,
            in_headers: false,
            unfolding: None,
        }
    }

    /// Drop any transaction in progress, keeping the HELO/EHLO identity
    pub fn reset(&mut self) {
        self.message = None;
        self.rejected_recipients = 0;
        self.in_headers = false;
        self.unfolding = None;
        if self.state != SmtpState::Closed {
            self.state = if self.client_identity.is_some() {
                SmtpState::Identified
            } else {
                SmtpState::Start
            };
        }
    }

    /// Record the identity from HELO or EHLO
    pub fn set_client_identity(&mut self, identity: String, extended: bool) {
        self.client_identity = Some(identity);
        self.extended = extended;
        self.reset();
    }

    /// Begin a new transaction, discarding any previous one
    pub fn start_mail(&mut self, from: Address) -> Result<(), SmtpError> {
        if !self.can_execute_command("MAIL") {
            return Err(SmtpError::InvalidState(
                "MAIL command requires HELO or EHLO first".to_string(),
            ));
        }

        self.reset();
        self.message = Some(Message::new(from));
        self.state = SmtpState::SenderSet;
        Ok(())
    }

    /// Add an accepted recipient to the current transaction
    pub fn add_recipient(&mut self, recipient: Address) -> Result<(), SmtpError> {
        let Some(message) = self.message.as_mut() else {
            return Err(SmtpError::InvalidState(
                "RCPT command requires MAIL first".to_string(),
            ));
        };

        message.add_recipient(recipient);
        self.state = SmtpState::RecipientsSet;
        Ok(())
    }

    /// Count a recipient the store refused
    pub fn reject_recipient(&mut self) {
        if self.message.is_some() {
            self.rejected_recipients += 1;
        }
    }

    /// Enter the DATA phase
    pub fn start_data_mode(&mut self) -> Result<(), SmtpError> {
        match self.state {
            SmtpState::RecipientsSet if !self.has_sender() => Err(SmtpError::InvalidState(
                "DATA command requires a sender address".to_string(),
            )),
            SmtpState::RecipientsSet => {
                self.in_headers = true;
                self.state = SmtpState::InTransaction;
                Ok(())
            }
            SmtpState::SenderSet if self.rejected_recipients > 0 => {
                Err(SmtpError::NoValidRecipients)
            }
            SmtpState::SenderSet => Err(SmtpError::InvalidState(
                "DATA command requires RCPT first".to_string(),
            )),
            _ => Err(SmtpError::InvalidState(
                "DATA command requires MAIL and RCPT first".to_string(),
            )),
        }
    }

    fn has_sender(&self) -> bool {
        self.message.as_ref().is_some_and(|m| !m.from.is_empty())
    }

    /// Whether lines are currently collected as message content
    pub fn in_data_mode(&self) -> bool {
        self.state == SmtpState::InTransaction
    }

    /// Add one line of message content (the terminating `.` excluded).
    ///
    /// Any line starting with `Subject:`, `To:` or `From:` sets the matching
    /// message field instead of going to the body; header values win over
    /// the envelope. Inside the header block, folded continuation lines
    /// extend the previous one of those headers, and the empty line ending
    /// the block is dropped. Everything else goes to the body.
    pub fn add_data_line(&mut self, line: &str) -> Result<(), SmtpError> {
        let Some(message) = self.message.as_mut() else {
            return Err(SmtpError::InvalidState(
                "Not in data collection mode".to_string(),
            ));
        };

        let line = if line.starts_with("..") { &line[1..] } else { line };

        if line.starts_with([' ', '\t']) {
            if let Some((field, value)) = self.unfolding.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
                field.apply(message, value);
                return Ok(());
            }
        }
        self.unfolding = None;

        if let Some((field, value)) = HeaderField::split(line) {
            field.apply(message, value);
            if self.in_headers {
                self.unfolding = Some((field, value.to_string()));
            }
            return Ok(());
        }

        if self.in_headers {
            if line.is_empty() {
                self.in_headers = false;
                return Ok(());
            }
            if !looks_like_header(line) {
                self.in_headers = false;
            }
        }

        message.push_body_line(line);
        Ok(())
    }

    /// Finish the DATA phase and hand back the completed message
    pub fn finish_data_collection(&mut self) -> Result<Message, SmtpError> {
        if !self.in_data_mode() {
            return Err(SmtpError::InvalidState(
                "Not in data collection mode".to_string(),
            ));
        }

        let mut message = self
            .message
            .take()
            .ok_or_else(|| SmtpError::InvalidState("No sender specified".to_string()))?;
        message.received_at = std::time::SystemTime::now();

        self.reset();
        Ok(message)
    }

    /// Mark the session as finished
    pub fn close(&mut self) {
        self.message = None;
        self.state = SmtpState::Closed;
    }

    /// Check if the session is ready for a specific command
    pub fn can_execute_command(&self, command: &str) -> bool {
        if self.state == SmtpState::Closed {
            return false;
        }

        match command {
            "HELO" | "EHLO" => true,
            "MAIL" => self.state != SmtpState::Start,
            "RCPT" => matches!(self.state, SmtpState::SenderSet | SmtpState::RecipientsSet),
            "DATA" => self.state == SmtpState::RecipientsSet,
            "RSET" | "VRFY" | "NOOP" | "QUIT" => true,
            _ => false,
        }
    }

    /// Get the current recipient count
    pub fn recipient_count(&self) -> usize {
        self.message.as_ref().map_or(0, |m| m.to.len())
    }
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Headers that update the message instead of landing in the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    Subject,
    From,
    To,
}

impl HeaderField {
    /// Split a line starting with a recognized header token into the field
    /// and its value
    fn split(line: &str) -> Option<(Self, &str)> {
        [
            ("Subject:", Self::Subject),
            ("From:", Self::From),
            ("To:", Self::To),
        ]
        .into_iter()
        .find_map(|(token, field)| line.strip_prefix(token).map(|value| (field, value)))
    }

    fn apply(self, message: &mut Message, value: &str) {
        match self {
            Self::Subject => message.subject = value.trim().to_string(),
            Self::From => message.from = Address::parse_mailbox(value),
            Self::To => {
                let recipients: Vec<Address> = split_address_list(value)
                    .into_iter()
                    .map(Address::parse_mailbox)
                    .filter(|addr| !addr.is_empty())
                    .collect();
                if recipients.is_empty() {
                    return;
                }
                message.to.clear();
                for recipient in recipients {
                    message.add_recipient(recipient);
                }
            }
        }
    }
}

/// Split an address list on commas outside quoted display names and `<...>`
fn split_address_list(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut bracketed = false;

    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '<' if !quoted => bracketed = true,
            '>' if !quoted => bracketed = false,
            ',' if !quoted && !bracketed => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

fn looks_like_header(line: &str) -> bool {
    if line.starts_with([' ', '\t']) {
        return true;
    }
    match line.split_once(':') {
        Some((name, _)) => !name.is_empty() && !name.contains(char::is_whitespace),
        None => false,
    }
}

//! Implementation of SMTP commands

use crate::smtp::address::Address;
use crate::smtp::error::SmtpError;
use crate::smtp::response::{SmtpResponse, codes};
use crate::smtp::session::SmtpSession;
use crate::store::MailStore;

use tracing::{debug, info};

/// Handles SMTP commands and returns appropriate responses
pub struct SmtpCommandHandler<'a> {
    hostname: &'a str,
    store: &'a dyn MailStore,
}

impl<'a> SmtpCommandHandler<'a> {
    /// Create a new command handler
    pub fn new(hostname: &'a str, store: &'a dyn MailStore) -> Self {
        Self { hostname, store }
    }

    /// Process a command line and return a response.
    ///
    /// Verbs are matched case-sensitively. Errors leave the session state as
    /// it was and are meant to be answered, not to end the connection.
    pub fn process_command(
        &self,
        command_line: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        let parts: Vec<&str> = command_line.split_whitespace().collect();
        let Some(&verb) = parts.first() else {
            return Err(SmtpError::InvalidSyntax("No command".to_string()));
        };

        match verb {
            "HELO" => self.handle_helo(&parts, session, false),
            "EHLO" => self.handle_helo(&parts, session, true),
            "MAIL" => self.handle_mail(&parts, session),
            "RCPT" => self.handle_rcpt(&parts, session),
            "DATA" => self.handle_data(&parts, session),
            "RSET" => self.handle_rset(&parts, session),
            "VRFY" => self.handle_vrfy(&parts),
            "NOOP" => Ok(SmtpResponse::ok()),
            "QUIT" => self.handle_quit(&parts, session),
            _ => Err(SmtpError::InvalidCommand(verb.to_string())),
        }
    }

    /// Handle HELO and EHLO commands
    fn handle_helo(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
        extended: bool,
    ) -> Result<SmtpResponse, SmtpError> {
        let Some(identity) = parts.get(1) else {
            return Err(SmtpError::InvalidSyntax(format!(
                "{} requires a domain argument",
                parts[0]
            )));
        };

        session.set_client_identity(identity.to_string(), extended);
        Ok(SmtpResponse::helo(self.hostname, identity))
    }

    /// Handle MAIL command
    fn handle_mail(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("MAIL") {
            return Err(SmtpError::InvalidState(
                "MAIL command requires HELO or EHLO first".to_string(),
            ));
        }

        let from = parse_path_argument(parts, "FROM")?;
        debug!(%from, "transaction started");
        session.start_mail(from)?;

        Ok(SmtpResponse::ok())
    }

    /// Handle RCPT command
    fn handle_rcpt(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("RCPT") {
            return Err(SmtpError::InvalidState(
                "RCPT command requires MAIL first".to_string(),
            ));
        }

        let recipient = parse_path_argument(parts, "TO")?;
        if !self.store.is_registered(&recipient)? {
            info!(%recipient, "rejected unknown recipient");
            session.reject_recipient();
            return Err(SmtpError::MailboxNotFound(recipient));
        }

        session.add_recipient(recipient)?;
        Ok(SmtpResponse::ok())
    }

    /// Handle DATA command
    fn handle_data(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if parts.len() > 1 {
            return Err(SmtpError::InvalidSyntax(format!(
                "Arguments after DATA: {}",
                parts[1..].join(" ")
            )));
        }

        session.start_data_mode()?;
        Ok(SmtpResponse::data_start())
    }

    /// Handle RSET command
    fn handle_rset(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if parts.len() > 1 {
            return Err(SmtpError::InvalidSyntax(format!(
                "Arguments after RSET: {}",
                parts[1..].join(" ")
            )));
        }

        session.reset();
        Ok(SmtpResponse::ok())
    }

    /// Handle VRFY command, accepting `addr` or `Display Name <addr>`
    fn handle_vrfy(&self, parts: &[&str]) -> Result<SmtpResponse, SmtpError> {
        let address = match &parts[1..] {
            [] => {
                return Err(SmtpError::InvalidSyntax(
                    "VRFY requires an address".to_string(),
                ));
            }
            [single] => Address::parse(single),
            [.., last] if last.starts_with('<') && last.ends_with('>') => Address::parse(last),
            _ => {
                return Err(SmtpError::InvalidSyntax(
                    "Invalid username format".to_string(),
                ));
            }
        };

        if self.store.is_registered(&address)? {
            Ok(SmtpResponse::new(codes::OK, &address.to_string()))
        } else {
            Err(SmtpError::MailboxNotFound(address))
        }
    }

    /// Handle QUIT command
    fn handle_quit(
        &self,
        parts: &[&str],
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if parts.len() > 1 {
            return Err(SmtpError::InvalidSyntax(format!(
                "Arguments after QUIT: {}",
                parts[1..].join(" ")
            )));
        }

        session.close();
        Ok(SmtpResponse::quit())
    }
}

/// Parse the `KEY:<address>` argument of MAIL and RCPT.
///
/// Only the first token after the colon is the address, so ESMTP parameters
/// following it are ignored.
fn parse_path_argument(parts: &[&str], key: &str) -> Result<Address, SmtpError> {
    let argument = parts[1..].join(" ");
    let Some((prefix, value)) = argument.split_once(':') else {
        return Err(SmtpError::InvalidSyntax(format!(
            "{} command must be '{} {key}:<address>'",
            parts[0], parts[0]
        )));
    };

    if !prefix.trim().eq_ignore_ascii_case(key) {
        return Err(SmtpError::InvalidSyntax(format!(
            "{} command must be '{} {key}:<address>'",
            parts[0], parts[0]
        )));
    }

    let path = value.split_whitespace().next().unwrap_or_default();
    Ok(Address::parse(path))
}

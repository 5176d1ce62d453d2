//! SMTP response handling

/// Reply codes spoken by the server
pub mod codes {
    pub const GREETING: u16 = 220;
    pub const CLOSING: u16 = 221;
    pub const OK: u16 = 250;
    pub const START_MAIL_INPUT: u16 = 354;
    pub const SERVICE_UNAVAILABLE: u16 = 421;
    pub const LOCAL_ERROR: u16 = 451;
    pub const SYNTAX_ERROR: u16 = 500;
    pub const OUT_OF_SEQUENCE: u16 = 503;
    pub const NO_VALID_RECIPIENTS: u16 = 504;
    pub const MAILBOX_NOT_FOUND: u16 = 550;
}

/// Represents an SMTP response that can be sent to a client
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpResponse {
    /// The SMTP response code (e.g., 250, 354, 500)
    pub code: u16,
    /// The human-readable message
    pub message: String,
}

impl SmtpResponse {
    /// Create a new SMTP response
    pub fn new(code: u16, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    /// Create a success response (250 OK)
    pub fn ok() -> Self {
        Self::new(codes::OK, "OK")
    }

    /// Create a greeting response (220)
    pub fn greeting(hostname: &str) -> Self {
        Self::new(
            codes::GREETING,
            &format!(
                "{hostname} {} {} ready",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
        )
    }

    /// Create a HELO/EHLO response (250)
    pub fn helo(hostname: &str, client_identity: &str) -> Self {
        Self::new(codes::OK, &format!("{hostname} Hello {client_identity}"))
    }

    /// Create a DATA intermediate response (354)
    pub fn data_start() -> Self {
        Self::new(
            codes::START_MAIL_INPUT,
            "Start mail input; end with <CR><LF>.<CR><LF>",
        )
    }

    /// Create a QUIT response (221)
    pub fn quit() -> Self {
        Self::new(codes::CLOSING, "Closing connection")
    }

    /// Create an error response from an error
    pub fn error(code: u16, message: &str) -> Self {
        Self::new(code, message)
    }

    /// Format the response for sending over the wire
    pub fn format(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }
}

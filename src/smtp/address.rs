//! Mail addresses

use std::fmt;

/// A `local@domain` identity.
///
/// Parsing is lenient and never fails: whatever structure the input has is
/// kept, and a missing `@` simply leaves the domain empty. Whether an address
/// is acceptable is decided later by the mail store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Address {
    /// The part before the `@`
    pub local_part: String,
    /// The part after the `@` (may be empty)
    pub domain: String,
}

impl Address {
    /// Create an address from its two components
    pub fn new(local_part: &str, domain: &str) -> Self {
        Self {
            local_part: local_part.to_owned(),
            domain: domain.to_owned(),
        }
    }

    /// Parse an address such as `<user@domain>`, `user@domain` or `user`.
    ///
    /// Surrounding spaces and angle brackets are stripped. With more than one
    /// `@`, only the first two segments are kept.
    pub fn parse(s: &str) -> Self {
        let s = s.trim_matches(|c| c == ' ' || c == '<' || c == '>');
        let mut segments = s.split('@');
        let local_part = segments.next().unwrap_or_default();
        let domain = segments.next().unwrap_or_default();
        Self::new(local_part, domain)
    }

    /// Parse the address out of a header value like `Name <user@domain>`.
    ///
    /// When an angle-bracketed part is present it wins over the display name;
    /// otherwise the whole value is parsed.
    pub fn parse_mailbox(value: &str) -> Self {
        let value = value.trim();
        match (value.rfind('<'), value.rfind('>')) {
            (Some(open), Some(close)) if open < close => Self::parse(&value[open + 1..close]),
            _ => Self::parse(value),
        }
    }

    /// True when both components are empty
    pub fn is_empty(&self) -> bool {
        self.local_part.is_empty() && self.domain.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{}@{}", self.local_part, self.domain)
        }
    }
}

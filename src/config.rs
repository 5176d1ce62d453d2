//! Server configuration

use crate::smtp::address::Address;
use crate::smtp::error::ConfigError;
use crate::smtp::queue::DeliveryQueue;

use serde::Deserialize;
use std::path::Path;

/// Local part of the administrative address every server accepts mail for
pub const POSTMASTER: &str = "Postmaster";

/// Settings for one server instance. Missing TOML fields take their defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Name announced in the greeting and HELO replies
    pub hostname: String,
    /// Mail domain used for the postmaster and bare mailbox names
    pub domain: String,
    /// Socket address to listen on
    pub listen_addr: String,
    /// Number of completed messages that may wait for delivery
    pub queue_capacity: usize,
    /// Mailboxes registered at startup; bare names get `domain` appended
    pub mailboxes: Vec<String>,
    /// Register unknown senders when their mail is stored
    pub auto_register_senders: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "maildrop.local".to_string(),
            domain: "localhost".to_string(),
            listen_addr: "127.0.0.1:2525".to_string(),
            queue_capacity: DeliveryQueue::DEFAULT_CAPACITY,
            mailboxes: Vec::new(),
            auto_register_senders: false,
        }
    }
}

impl ServerConfig {
    /// Load a config from a TOML file; missing keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Addresses registered before the first connection is accepted
    pub fn well_known_addresses(&self) -> Vec<Address> {
        let mut addresses = vec![Address::new(POSTMASTER, &self.domain)];
        for mailbox in &self.mailboxes {
            let mut addr = Address::parse(mailbox);
            if addr.domain.is_empty() {
                addr.domain = self.domain.clone();
            }
            if !addresses.contains(&addr) {
                addresses.push(addr);
            }
        }
        addresses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.domain, "localhost");
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(
            config.well_known_addresses(),
            vec![Address::new("Postmaster", "localhost")]
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            hostname = "mx.example.com"
            mailboxes = ["recipient", "alice@example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.hostname, "mx.example.com");
        assert_eq!(config.listen_addr, "127.0.0.1:2525");
        assert_eq!(
            config.well_known_addresses(),
            vec![
                Address::new("Postmaster", "localhost"),
                Address::new("recipient", "localhost"),
                Address::new("alice", "example.com"),
            ]
        );
    }

    #[test]
    fn test_invalid_toml() {
        let result = ServerConfig::from_toml_str("queue_capacity = \"lots\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain = \"example.org\"").unwrap();
        writeln!(file, "auto_register_senders = true").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.domain, "example.org");
        assert!(config.auto_register_senders);
    }

    #[test]
    fn test_missing_file() {
        let result = ServerConfig::from_file("/nonexistent/maildrop.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}

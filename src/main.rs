use clap::Parser;
use maildrop::{MemoryStore, ServerConfig, SmtpServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Minimal SMTP server delivering into local mailboxes
#[derive(Parser)]
#[command(name = "maildrop", version, about, long_about = None)]
struct Cli {
    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<String>,

    /// Name announced to clients
    #[arg(long)]
    hostname: Option<String>,

    /// Local mail domain
    #[arg(long)]
    domain: Option<String>,

    /// Register a mailbox (repeatable); bare names use the local domain
    #[arg(short, long = "mailbox")]
    mailboxes: Vec<String>,

    /// Number of messages that may wait for delivery
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Register unknown senders when their mail is stored
    #[arg(long)]
    auto_register_senders: bool,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, maildrop::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(hostname) = self.hostname {
            config.hostname = hostname;
        }
        if let Some(domain) = self.domain {
            config.domain = domain;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        config.mailboxes.extend(self.mailboxes);
        config.auto_register_senders |= self.auto_register_senders;
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    info!("Starting maildrop SMTP server");
    info!("  Address: {}", config.listen_addr);
    info!("  Hostname: {}", config.hostname);
    info!("  Domain: {}", config.domain);

    let store = Arc::new(MemoryStore::new().with_auto_register_senders(config.auto_register_senders));
    let server = match SmtpServer::new(config, store) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize mail store: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start() {
        error!("Failed to start server: {e}");
        std::process::exit(1);
    }
}

//! SMTP server implementation

pub mod address;
pub mod commands;
pub mod error;
pub mod message;
pub mod queue;
pub mod response;
pub mod server;
pub mod session;

pub use address::Address;
pub use error::{ConfigError, SmtpError, StoreError};
pub use message::Message;
pub use queue::{DeliveryQueue, DeliveryWorker};
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SmtpSession, SmtpState};

//! Mail storage
//!
//! A [`MailStore`] owns the set of registered addresses and the mailbox of
//! each one. Sessions only ever read from it (`is_registered`); messages are
//! written by the single delivery worker through [`MailStore::commit`].

mod memory;

pub use memory::MemoryStore;

use crate::smtp::address::Address;
use crate::smtp::error::StoreError;
use crate::smtp::message::Message;

/// Identifies a registered mailbox within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MailboxId(pub usize);

/// Outcome of committing one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    /// Recipients whose mailbox received the message
    pub delivered: Vec<Address>,
    /// Recipients that were not registered at commit time
    pub dropped: Vec<Address>,
}

impl Delivery {
    /// True when no mailbox received the message
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

/// Storage backend contract used by sessions and the delivery worker.
///
/// Implementations synchronize internally: any number of readers may run
/// concurrently, writers are exclusive, and no reader ever observes a
/// partially applied write.
pub trait MailStore: Send + Sync {
    /// Register an address. Registering an existing address is a no-op that
    /// returns its existing id and keeps its mail.
    fn register(&self, addr: &Address) -> Result<MailboxId, StoreError>;

    /// Whether an address has a mailbox
    fn is_registered(&self, addr: &Address) -> Result<bool, StoreError>;

    /// Append a message to the mailbox of every registered recipient.
    ///
    /// Unregistered recipients are skipped and reported in
    /// [`Delivery::dropped`]; this is not an error.
    fn commit(&self, message: Message) -> Result<Delivery, StoreError>;

    /// Messages received by an address, oldest first. An unknown address has
    /// no mail; use [`MailStore::is_registered`] to tell the two apart.
    fn list_mail(&self, addr: &Address) -> Result<Vec<Message>, StoreError>;

    /// All registered addresses in registration order
    fn addresses(&self) -> Result<Vec<Address>, StoreError>;
}

//! In-memory mail store

use crate::smtp::address::Address;
use crate::smtp::error::StoreError;
use crate::smtp::message::Message;
use crate::store::{Delivery, MailStore, MailboxId};

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug)]
struct Mailbox {
    address: Address,
    messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct Directory {
    ids: HashMap<Address, MailboxId>,
    mailboxes: Vec<Mailbox>,
}

impl Directory {
    fn register(&mut self, addr: &Address) -> MailboxId {
        if let Some(id) = self.ids.get(addr) {
            return *id;
        }

        let id = MailboxId(self.mailboxes.len());
        self.mailboxes.push(Mailbox {
            address: addr.clone(),
            messages: Vec::new(),
        });
        self.ids.insert(addr.clone(), id);
        debug!(address = %addr, id = id.0, "registered mailbox");
        id
    }
}

/// Mail store keeping every mailbox in process memory.
///
/// A single `RwLock` guards the whole directory, so each operation is atomic
/// with respect to every other one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    directory: RwLock<Directory>,
    auto_register_senders: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register unknown senders when their mail is committed
    pub fn with_auto_register_senders(mut self, enabled: bool) -> Self {
        self.auto_register_senders = enabled;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Directory>, StoreError> {
        self.directory.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Directory>, StoreError> {
        self.directory.write().map_err(|_| StoreError::Poisoned)
    }
}

impl MailStore for MemoryStore {
    fn register(&self, addr: &Address) -> Result<MailboxId, StoreError> {
        Ok(self.write()?.register(addr))
    }

    fn is_registered(&self, addr: &Address) -> Result<bool, StoreError> {
        Ok(self.read()?.ids.contains_key(addr))
    }

    fn commit(&self, mut message: Message) -> Result<Delivery, StoreError> {
        let mut directory = self.write()?;

        if self.auto_register_senders && !message.from.is_empty() {
            directory.register(&message.from);
        }

        let mut delivery = Delivery::default();
        let mut targets = Vec::new();
        for recipient in std::mem::take(&mut message.to) {
            if delivery.delivered.contains(&recipient) || delivery.dropped.contains(&recipient) {
                continue;
            }
            match directory.ids.get(&recipient) {
                Some(id) => {
                    targets.push(*id);
                    delivery.delivered.push(recipient);
                }
                None => delivery.dropped.push(recipient),
            }
        }

        message.to = delivery.delivered.clone();
        for id in targets {
            directory.mailboxes[id.0].messages.push(message.clone());
        }

        Ok(delivery)
    }

    fn list_mail(&self, addr: &Address) -> Result<Vec<Message>, StoreError> {
        let directory = self.read()?;
        Ok(directory
            .ids
            .get(addr)
            .map(|id| directory.mailboxes[id.0].messages.clone())
            .unwrap_or_default())
    }

    fn addresses(&self) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .read()?
            .mailboxes
            .iter()
            .map(|mailbox| mailbox.address.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn message(from: &str, to: &[&str], subject: &str) -> Message {
        let mut message = Message::new(Address::parse(from));
        for rcpt in to {
            message.add_recipient(Address::parse(rcpt));
        }
        message.subject = subject.to_string();
        message
    }

    #[test]
    fn test_register_is_idempotent() {
        let store = MemoryStore::new();
        let alice = Address::new("alice", "localhost");

        let first = store.register(&alice).unwrap();
        store.commit(message("a@x", &["alice@localhost"], "one")).unwrap();
        let second = store.register(&alice).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.addresses().unwrap(), vec![alice.clone()]);
        assert_eq!(store.list_mail(&alice).unwrap().len(), 1);
    }

    #[test]
    fn test_is_registered() {
        let store = MemoryStore::new();
        store.register(&Address::new("bob", "localhost")).unwrap();

        assert!(store.is_registered(&Address::new("bob", "localhost")).unwrap());
        assert!(!store.is_registered(&Address::new("bob", "example.com")).unwrap());
        assert!(!store.is_registered(&Address::new("bob", "")).unwrap());
    }

    #[test]
    fn test_commit_drops_unregistered_recipients() {
        let store = MemoryStore::new();
        let bob = Address::new("bob", "localhost");
        store.register(&bob).unwrap();

        let delivery = store
            .commit(message("a@x", &["bob@localhost", "ghost@localhost"], "hi"))
            .unwrap();

        assert_eq!(delivery.delivered, vec![bob.clone()]);
        assert_eq!(delivery.dropped, vec![Address::new("ghost", "localhost")]);

        let mail = store.list_mail(&bob).unwrap();
        assert_eq!(mail.len(), 1);
        assert_eq!(mail[0].to, vec![bob]);
        assert!(store.list_mail(&Address::new("ghost", "localhost")).unwrap().is_empty());
    }

    #[test]
    fn test_commit_without_registered_recipient_delivers_nothing() {
        let store = MemoryStore::new();
        let delivery = store.commit(message("a@x", &["ghost@localhost"], "hi")).unwrap();
        assert!(delivery.is_empty());
    }

    #[test]
    fn test_duplicate_recipient_delivers_once() {
        let store = MemoryStore::new();
        let bob = Address::new("bob", "localhost");
        store.register(&bob).unwrap();

        let mut msg = message("a@x", &["bob@localhost"], "hi");
        msg.to.push(bob.clone());
        let delivery = store.commit(msg).unwrap();

        assert_eq!(delivery.delivered.len(), 1);
        assert_eq!(store.list_mail(&bob).unwrap().len(), 1);
    }

    #[test]
    fn test_list_mail_keeps_receipt_order() {
        let store = MemoryStore::new();
        let bob = Address::new("bob", "localhost");
        store.register(&bob).unwrap();

        store.commit(message("a@x", &["bob@localhost"], "m1")).unwrap();
        store.commit(message("a@x", &["bob@localhost"], "m2")).unwrap();

        let subjects: Vec<String> = store
            .list_mail(&bob)
            .unwrap()
            .into_iter()
            .map(|m| m.subject)
            .collect();
        assert_eq!(subjects, vec!["m1", "m2"]);
    }

    #[test]
    fn test_auto_register_senders() {
        let store = MemoryStore::new().with_auto_register_senders(true);
        store.register(&Address::new("bob", "localhost")).unwrap();

        store.commit(message("carol@example.com", &["bob@localhost"], "hi")).unwrap();
        assert!(store.is_registered(&Address::new("carol", "example.com")).unwrap());

        let plain = MemoryStore::new();
        plain.register(&Address::new("bob", "localhost")).unwrap();
        plain.commit(message("carol@example.com", &["bob@localhost"], "hi")).unwrap();
        assert!(!plain.is_registered(&Address::new("carol", "example.com")).unwrap());
    }

    #[test]
    fn test_concurrent_registration_and_reads() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let addr = Address::new("shared", "localhost");
                    let id = store.register(&addr).unwrap();
                    store.register(&Address::new(&format!("user{i}"), "localhost")).unwrap();
                    assert!(store.is_registered(&addr).unwrap());
                    id
                })
            })
            .collect();

        let ids: Vec<MailboxId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.addresses().unwrap().len(), 9);
    }
}

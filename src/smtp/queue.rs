//! Delivery queue between sessions and the mail store
//!
//! Sessions push completed messages into a bounded channel; one worker thread
//! drains it and commits each message to the store. Commits are therefore
//! serialized in enqueue order, and a full queue makes producers wait instead
//! of losing mail.

use crate::smtp::error::SmtpError;
use crate::smtp::message::Message;
use crate::store::MailStore;

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Producer handle of the delivery queue, cloned into every session
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    sender: SyncSender<Message>,
}

impl DeliveryQueue {
    /// Capacity used when none is configured
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Create a queue holding at most `capacity` pending messages
    pub fn bounded(capacity: usize) -> (Self, Receiver<Message>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (Self { sender }, receiver)
    }

    /// Hand a completed message to the worker, blocking while the queue is full
    pub fn enqueue(&self, message: Message) -> Result<(), SmtpError> {
        self.sender
            .send(message)
            .map_err(|_| SmtpError::QueueClosed)
    }
}

/// The single consumer committing queued messages to a store
#[derive(Debug)]
pub struct DeliveryWorker {
    handle: JoinHandle<usize>,
}

impl DeliveryWorker {
    /// Start the worker thread.
    ///
    /// It runs until every [`DeliveryQueue`] handle has been dropped and the
    /// remaining messages are committed.
    pub fn spawn(receiver: Receiver<Message>, store: Arc<dyn MailStore>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("delivery".to_string())
            .spawn(move || drain(receiver, store.as_ref()))?;
        Ok(Self { handle })
    }

    /// Wait for the worker to finish and return how many messages it stored
    pub fn join(self) -> thread::Result<usize> {
        self.handle.join()
    }
}

fn drain(receiver: Receiver<Message>, store: &dyn MailStore) -> usize {
    info!("delivery worker started");
    let mut committed = 0;

    for message in receiver {
        let from = message.from.clone();
        match store.commit(message) {
            Ok(delivery) if delivery.is_empty() => {
                warn!(%from, dropped = delivery.dropped.len(), "no registered recipient, message dropped");
            }
            Ok(delivery) => {
                committed += 1;
                debug!(
                    %from,
                    delivered = delivery.delivered.len(),
                    dropped = delivery.dropped.len(),
                    "message committed"
                );
            }
            Err(e) => {
                error!(%from, error = %e, "failed to commit message, dropping it");
            }
        }
    }

    info!(committed, "delivery worker stopped");
    committed
}

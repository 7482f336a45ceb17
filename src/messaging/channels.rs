// Lock-free communication channels

use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationKind};
use ringbuf::traits::Producer;
use ringbuf::{HeapRb, traits::Split};
use std::sync::{Arc, Mutex};

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Notification producer shared between the control thread and audio callbacks
pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Push a notification without blocking. Dropped when the lock is contended
/// or the queue is full; returns whether it was queued.
pub fn try_notify(tx: &SharedNotificationProducer, kind: NotificationKind) -> bool {
    match tx.try_lock() {
        Ok(mut producer) => producer.try_push(Notification::new(kind)).is_ok(),
        Err(_) => false,
    }
}

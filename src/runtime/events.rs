/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use std::sync::Mutex;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::sync::lock;

/**
 * Fan-out channel for events raised by one control loop and consumed by others.
 *
 * Every subscriber gets its own unbounded receiver and drains it from its own
 * loop, so no subscriber code ever runs on the publisher's call stack.
 * Subscribers that dropped their receiver are pruned on the next publish.
 */
#[derive(Debug)]
pub struct EventBus<T> {
    subscribers: Mutex<Vec<cbc::Sender<T>>>,
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> EventBus<T> {
        EventBus {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> cbc::Receiver<T> {
        let (tx, rx) = cbc::unbounded::<T>();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Routes events into an existing channel, so one consumer can merge
    /// several buses into a single receiver.
    pub fn attach(&self, tx: cbc::Sender<T>) {
        lock(&self.subscribers).push(tx);
    }

    pub fn publish(&self, event: T) {
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        EventBus::new()
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/

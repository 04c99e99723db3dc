//! Registry of clients blocked on list keys.
//!
//! A blocking pop registers a one-shot waiter under its key; every push
//! that lands at least one element wakes the oldest waiter still alive.
//! A waiter whose receiving side has been dropped (timeout, disconnect)
//! is skipped in favor of the next, so a cancelled BLPOP never consumes
//! a wake-up.

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct State {
    list_waiters: HashMap<String, VecDeque<oneshot::Sender<()>>>,
}

impl State {
    pub fn new() -> Self {
        State {
            list_waiters: HashMap::new(),
        }
    }

    /// Enqueues a waiter for `key` and hands back the receiving side.
    pub fn register_list_waiter(&mut self, key: &str) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        self.list_waiters
            .entry(key.to_string())
            .or_default()
            .push_back(sender);
        receiver
    }

    /// Wakes the oldest live waiter for `key`, if any.
    pub fn wake_list_waiter(&mut self, key: &str) {
        let Some(waiters) = self.list_waiters.get_mut(key) else {
            return;
        };

        while let Some(waiter) = waiters.pop_front() {
            if waiter.send(()).is_ok() {
                break;
            }
        }

        if waiters.is_empty() {
            self.list_waiters.remove(key);
        }
    }

    #[cfg(test)]
    fn waiter_count(&self, key: &str) -> usize {
        self.list_waiters.get(key).map(|w| w.len()).unwrap_or(0)
    }
}

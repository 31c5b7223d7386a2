use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

#[derive(Debug, Default)]
struct MailboxState {
    queue:  VecDeque<Value>,
    closed: bool,
}

/// An unbounded FIFO of values with blocking receive.
///
/// Closing is one-way: a closed mailbox rejects sends, hands out what is
/// still queued, and then fails every receive.
#[derive(Debug, Default)]
pub struct Mailbox {
    state: Mutex<MailboxState>,
    ready: Condvar,
}

impl Mailbox {
    /// Creates an open, empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `value` and wakes one waiting receiver.
    ///
    /// # Errors
    /// Returns a `ProcessError` if the mailbox is closed.
    pub fn send(&self, value: Value) -> EvalResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(closed_error());
        }
        state.queue.push_back(value);
        self.ready.notify_one();
        Ok(())
    }

    /// Dequeues the oldest value, blocking until one arrives.
    ///
    /// With a `timeout`, gives up once it elapses.
    ///
    /// # Errors
    /// Returns a `ProcessError` if the mailbox is closed and empty, or if the
    /// timeout expires first.
    pub fn recv(&self, timeout: Option<Duration>) -> EvalResult<Value> {
        let state = self.lock();
        let waiting = |s: &mut MailboxState| s.queue.is_empty() && !s.closed;

        let mut state = match timeout {
            None => self.ready.wait_while(state, waiting).unwrap_or_else(PoisonError::into_inner),
            Some(limit) => {
                let (state, result) = self.ready
                                          .wait_timeout_while(state, limit, waiting)
                                          .unwrap_or_else(PoisonError::into_inner);
                if result.timed_out() && state.queue.is_empty() && !state.closed {
                    return Err(RuntimeError::process(format!("recv timed out after {}ms",
                                                             limit.as_millis())));
                }
                state
            },
        };

        state.queue.pop_front().ok_or_else(closed_error)
    }

    /// Dequeues the oldest value without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<Value> {
        self.lock().queue.pop_front()
    }

    /// Closes the mailbox and wakes every waiting receiver.
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }
}

fn closed_error() -> RuntimeError {
    RuntimeError::process("process channel was closed")
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn preserves_send_order() {
        let mailbox = Mailbox::new();
        for i in 0..5 {
            mailbox.send(Value::Integer(i)).unwrap();
        }
        for i in 0..5 {
            assert!(matches!(mailbox.recv(None).unwrap(), Value::Integer(n) if n == i));
        }
    }

    #[test]
    fn close_wakes_blocked_receivers() {
        let mailbox = Arc::new(Mailbox::new());
        let waiter = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || mailbox.recv(None))
        };
        thread::sleep(Duration::from_millis(20));
        mailbox.close();
        assert!(waiter.join().unwrap().is_err());
    }

    #[test]
    fn queued_values_survive_close() {
        let mailbox = Mailbox::new();
        mailbox.send(Value::Integer(1)).unwrap();
        mailbox.close();
        assert!(mailbox.send(Value::Integer(2)).is_err());
        assert!(matches!(mailbox.recv(None).unwrap(), Value::Integer(1)));
        assert!(mailbox.recv(None).is_err());
    }

    #[test]
    fn recv_times_out() {
        let mailbox = Mailbox::new();
        let err = mailbox.recv(Some(Duration::from_millis(10))).unwrap_err();
        assert!(err.message.contains("timed out"));
    }
}

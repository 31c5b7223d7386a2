/// Process mailboxes.
///
/// An unbounded FIFO guarded by a mutex, with a condition variable for
/// blocking receives and a one-way close.
pub mod mailbox;
/// The global process table.
///
/// Maps `(node, id)` to live processes. Entries are added on spawn and
/// removed when the process body finishes.
pub mod table;

use std::{fmt, sync::Arc, time::Duration};

use crate::interpreter::{
    evaluator::core::EvalResult, process::mailbox::Mailbox, value::core::Value,
};

/// The identity of a process: the node it runs on and its numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessKey {
    /// Node name.
    pub node: Arc<str>,
    /// Id, unique per node.
    pub id:   u64,
}

impl ProcessKey {
    /// Creates a key.
    #[must_use]
    pub fn new(node: &str, id: u64) -> Self {
        Self { node: Arc::from(node),
               id }
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.id)
    }
}

/// A lightweight process: an identity plus a mailbox.
///
/// The worker running the process body holds its own evaluator; this record
/// is only the addressable part, shared by every `Value::Process` handle.
#[derive(Debug)]
pub struct Process {
    key:     ProcessKey,
    mailbox: Mailbox,
}

impl Process {
    /// Creates a process record with an open mailbox.
    #[must_use]
    pub fn new(key: ProcessKey) -> Self {
        Self { key,
               mailbox: Mailbox::new() }
    }

    /// The `(node, id)` key.
    #[must_use]
    pub const fn key(&self) -> &ProcessKey {
        &self.key
    }

    /// Node name.
    #[must_use]
    pub fn node(&self) -> &str {
        &self.key.node
    }

    /// Numeric id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.key.id
    }

    /// The process mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Delivers `value` to the process.
    ///
    /// # Errors
    /// Returns a `ProcessError` if the process has finished.
    pub fn send(&self, value: Value) -> EvalResult<()> {
        tracing::trace!(process = %self.key, "send");
        self.mailbox.send(value)
    }

    /// Takes the next value from the process mailbox.
    ///
    /// # Errors
    /// Returns a `ProcessError` if the mailbox is closed and empty or the
    /// timeout expires.
    pub fn recv(&self, timeout: Option<Duration>) -> EvalResult<Value> {
        self.mailbox.recv(timeout)
    }

    /// Returns `true` once the process body has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.mailbox.is_closed()
    }
}

use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use once_cell::sync::OnceCell;

use crate::interpreter::process::{Process, ProcessKey};

static PROCESSES: OnceCell<RwLock<HashMap<ProcessKey, Arc<Process>>>> = OnceCell::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn processes() -> &'static RwLock<HashMap<ProcessKey, Arc<Process>>> {
    PROCESSES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Allocates the next process id on `node` and registers a fresh process.
pub fn register(node: &str) -> Arc<Process> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let process = Arc::new(Process::new(ProcessKey::new(node, id)));
    processes().write()
               .unwrap_or_else(PoisonError::into_inner)
               .insert(process.key().clone(), Arc::clone(&process));
    process
}

/// Finds a live process by node name and id.
#[must_use]
pub fn lookup(node: &str, id: u64) -> Option<Arc<Process>> {
    processes().read()
               .unwrap_or_else(PoisonError::into_inner)
               .get(&ProcessKey::new(node, id))
               .cloned()
}

/// Removes the process from the table and closes its mailbox.
pub fn remove(key: &ProcessKey) {
    let removed = processes().write()
                             .unwrap_or_else(PoisonError::into_inner)
                             .remove(key);
    if let Some(process) = removed {
        process.mailbox().close();
    }
}

/// Number of registered processes.
#[must_use]
pub fn count() -> usize {
    processes().read().unwrap_or_else(PoisonError::into_inner).len()
}

/// Closes and forgets every process and restarts id allocation.
pub fn clear() {
    let drained = std::mem::take(&mut *processes().write().unwrap_or_else(PoisonError::into_inner));
    for process in drained.values() {
        process.mailbox().close();
    }
    NEXT_ID.store(1, Ordering::Relaxed);
}

use std::{
    collections::HashMap,
    fmt, fs, io,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{config::Config, error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Stack size of interpreter threads. Evaluation recurses on the native
/// stack, so the platform default is too small for deep user recursion.
pub const INTERPRETER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Why a module could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// No search root has a file for the path.
    #[error("module '{0}' not found")]
    NotFound(String),
    /// The file exists but could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// The file that failed.
        path:   PathBuf,
        /// The underlying failure.
        source: io::Error,
    },
}

/// Maps an import path such as `a.b.c` to source text.
pub trait SourceLoader: Send + Sync {
    /// Loads the source of the module at `path`.
    ///
    /// # Errors
    /// Returns a [`LoaderError`] if the module does not exist or cannot be
    /// read.
    fn load(&self, path: &str) -> Result<String, LoaderError>;
}

/// Starts worker tasks for spawned processes.
pub trait Scheduler: Send + Sync {
    /// Runs `task` on a new worker named `name`.
    ///
    /// # Errors
    /// Returns a `ProcessError` if no worker could be started.
    fn spawn(&self, name: String, task: Box<dyn FnOnce() + Send>) -> EvalResult<()>;
}

/// Wall-clock time and sleeping.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
    /// Blocks the calling worker for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Loads `a.b.c` from `a/b/c.b`, trying each root in order.
#[derive(Debug, Clone)]
pub struct FsLoader {
    roots: Vec<PathBuf>,
}

impl FsLoader {
    /// Searches the working directory, then `install_path/lib` if given.
    #[must_use]
    pub fn new(install_path: Option<PathBuf>) -> Self {
        let mut roots = vec![PathBuf::from(".")];
        roots.extend(install_path.map(|p| p.join("lib")));
        Self { roots }
    }

    /// Searches exactly `roots`, in order.
    #[must_use]
    pub const fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn relative_path(path: &str) -> PathBuf {
        let mut relative = path.split('.').collect::<PathBuf>();
        relative.set_extension("b");
        relative
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> Result<String, LoaderError> {
        let relative = Self::relative_path(path);
        for root in &self.roots {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                tracing::debug!(module = path, file = %candidate.display(), "resolved import");
                return fs::read_to_string(&candidate).map_err(|source| LoaderError::Io { path: candidate,
                                                                                       source });
            }
        }
        Err(LoaderError::NotFound(path.to_string()))
    }
}

/// Serves modules from memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    modules: RwLock<HashMap<String, String>>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the module at `path`.
    #[must_use]
    pub fn with_module(self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Adds (or replaces) the module at `path`.
    pub fn insert(&self, path: impl Into<String>, source: impl Into<String>) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), source.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<String, LoaderError> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(path.to_string()))
    }
}

/// Runs every task on its own named OS thread with a large stack.
#[derive(Debug, Clone, Copy)]
pub struct ThreadScheduler {
    stack_size: usize,
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self { stack_size: INTERPRETER_STACK_SIZE }
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn(&self, name: String, task: Box<dyn FnOnce() + Send>) -> EvalResult<()> {
        thread::Builder::new().name(name)
                              .stack_size(self.stack_size)
                              .spawn(task)
                              .map(drop)
                              .map_err(|e| RuntimeError::process(format!("cannot start worker: {e}")))
    }
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH)
                         .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The capabilities the interpreter consumes from its environment.
///
/// Shared by the main evaluator and every spawned worker.
#[derive(Clone)]
pub struct Host {
    /// Resolves imports.
    pub loader:    Arc<dyn SourceLoader>,
    /// Starts process workers.
    pub scheduler: Arc<dyn Scheduler>,
    /// Time source for `now_ms` and `sleep`.
    pub clock:     Arc<dyn Clock>,
}

impl Host {
    /// The default host: filesystem imports, thread workers, system clock.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { loader:    Arc::new(FsLoader::new(config.install_path.clone())),
               scheduler: Arc::new(ThreadScheduler::default()),
               clock:     Arc::new(SystemClock), }
    }

    /// Replaces the source loader.
    #[must_use]
    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Replaces the scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Arc::new(scheduler);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_paths_map_to_files() {
        assert_eq!(FsLoader::relative_path("a.b.c"), PathBuf::from("a/b/c.b"));
    }

    #[test]
    fn memory_loader_reports_missing_modules() {
        let loader = MemoryLoader::new().with_module("util", "val x = 1");
        assert_eq!(loader.load("util").unwrap(), "val x = 1");
        assert!(matches!(loader.load("nope"), Err(LoaderError::NotFound(_))));
    }
}

//! Process-wide driver state
//!
//! Driver runtimes such as OpenNI2 must be initialized once per process before any device can
//! be opened, and shut down once when the process exits. This state is shared by every session
//! in the process; it is not owned by any of them.

use std::io;
use std::sync::OnceLock;

use log::{debug, warn};

type Outcome = Result<(), (io::ErrorKind, String)>;

/// Lazily initialized, process-wide driver runtime
///
/// Drivers keep one in a `static` and call [`Runtime::initialize`] from
/// [`crate::driver::Driver::initialize`], which every session invokes on creation. Only the
/// first call runs the initializer; later calls report the cached outcome, including a cached
/// failure.
///
/// # Example
///
/// ```
/// use onireader::context::Runtime;
///
/// static RUNTIME: Runtime = Runtime::new();
///
/// RUNTIME.initialize(|| Ok(()), None).unwrap();
/// assert!(RUNTIME.is_initialized());
/// ```
pub struct Runtime {
    outcome: OnceLock<Outcome>,
}

impl Runtime {
    pub const fn new() -> Self {
        Runtime {
            outcome: OnceLock::new(),
        }
    }

    /// Runs `init` unless it already ran, then returns its outcome
    ///
    /// # Arguments
    ///
    /// * `init` - Driver initializer
    /// * `teardown` - Shutdown hook, registered to run at process exit after a successful init
    pub fn initialize<F>(&self, init: F, teardown: Option<extern "C" fn()>) -> io::Result<()>
    where
        F: FnOnce() -> io::Result<()>,
    {
        let outcome = self.outcome.get_or_init(|| {
            debug!("initializing driver runtime");
            match init() {
                Ok(()) => {
                    if let Some(teardown) = teardown {
                        // atexit only fails when the handler table is full
                        if unsafe { libc::atexit(teardown) } != 0 {
                            warn!("could not register driver shutdown at exit");
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    warn!("driver runtime initialization failed: {}", e);
                    Err((e.kind(), e.to_string()))
                }
            }
        });

        match outcome {
            Ok(()) => Ok(()),
            Err((kind, msg)) => Err(io::Error::new(*kind, msg.clone())),
        }
    }

    /// Whether the runtime has been initialized successfully
    pub fn is_initialized(&self) -> bool {
        matches!(self.outcome.get(), Some(Ok(())))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn initializer_runs_once() {
        let runtime = Arc::new(Runtime::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let runtime = Arc::clone(&runtime);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    runtime.initialize(
                        || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        },
                        None,
                    )
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(runtime.is_initialized());
    }

    #[test]
    fn failure_is_cached() {
        let runtime = Runtime::new();
        let err = runtime
            .initialize(
                || Err(io::Error::new(io::ErrorKind::NotFound, "no runtime")),
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        // a second initializer is never run
        let err = runtime.initialize(|| Ok(()), None).unwrap_err();
        assert_eq!(err.to_string(), "no runtime");
        assert!(!runtime.is_initialized());
    }
}

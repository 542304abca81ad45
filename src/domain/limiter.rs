//! Wall-clock resource limiter.
//!
//! Jobs run on a worker thread while the caller waits on a channel with a
//! timeout. On expiry the limiter flips a shared cancellation flag and
//! returns immediately, so a runaway program can never block its caller
//! longer than the configured ceiling. The worker polls the flag at
//! statement granularity and winds down on its own; no OS signals, no thread
//! killing.

use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::error::{ExecutionError, LimitKind};

/// Ceilings for a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimit {
    pub max_duration_ms: u64,
    pub max_memory_bytes: u64,
    pub max_output_len: usize,
}

impl Default for ResourceLimit {
    fn default() -> Self {
        Self {
            max_duration_ms: 1_000,
            max_memory_bytes: 64 * 1024 * 1024,
            max_output_len: 1_000_000,
        }
    }
}

/// Run `job` under the wall-clock ceiling.
///
/// The job receives the cancellation flag and must check it periodically;
/// the limiter's return is prompt either way.
pub fn run_bounded<T, F>(limits: &ResourceLimit, job: F) -> Result<T, ExecutionError>
where
    T: Send + 'static,
    F: FnOnce(&AtomicBool) -> Result<T, ExecutionError> + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    thread::spawn(move || {
        // The receiver may be gone if we timed out; nothing to do then.
        let _ = tx.send(job(&worker_cancel));
    });

    match rx.recv_timeout(Duration::from_millis(limits.max_duration_ms)) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
            Err(ExecutionError::ResourceLimitExceeded {
                kind: LimitKind::Time,
                limit: limits.max_duration_ms,
                observed: started.elapsed().as_millis() as u64,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExecutionError::RuntimeFault {
            message: "execution worker terminated unexpectedly".into(),
        }),
    }
}

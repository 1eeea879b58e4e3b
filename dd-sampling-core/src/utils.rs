// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, io, sync::Mutex, thread};

use tokio_util::sync::CancellationToken;

/// Handle on a background worker thread driven by a [`CancellationToken`].
///
/// Dropping the handle cancels the worker but does not wait for it.
pub struct WorkerHandle {
    name: &'static str,
    join_handle: Mutex<Option<thread::JoinHandle<()>>>,
    cancel_token: CancellationToken,
}

impl WorkerHandle {
    /// Spawns `f` on a named thread.
    ///
    /// The worker receives a clone of the cancellation token and is expected to return
    /// once it is cancelled. Logs emitted by the worker follow the test logger of the
    /// spawning thread.
    pub fn spawn<F>(name: &'static str, f: F) -> io::Result<Self>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let worker_token = cancel_token.clone();
        let join_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(crate::log::with_local_logger(move || f(worker_token)))?;
        Ok(Self {
            name,
            join_handle: Mutex::new(Some(join_handle)),
            cancel_token,
        })
    }

    pub fn trigger_shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Cancels the worker and blocks until its thread has exited.
    ///
    /// Only the first call joins the thread, later calls return `Ok(())` immediately.
    pub fn shutdown(&self) -> Result<(), WorkerError> {
        self.trigger_shutdown();
        let Some(handle) = self
            .join_handle
            .lock()
            .map_err(|_| {
                crate::dd_error!("{}.shutdown: handle mutex poisoned", self.name);
                WorkerError::HandleMutexPoisoned
            })?
            .take()
        else {
            return Ok(());
        };
        handle.join().map_err(|e| {
            let err = if let Some(e) = e.downcast_ref::<&'static str>() {
                e
            } else if let Some(e) = e.downcast_ref::<String>() {
                e
            } else {
                "unknown panic type"
            };
            crate::dd_error!("{}.shutdown: Worker panicked: {}", self.name, err);
            WorkerError::WorkerPanicked(err.to_string())
        })?;
        Ok(())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.trigger_shutdown();
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    HandleMutexPoisoned,
    WorkerPanicked(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandleMutexPoisoned => write!(f, "handle mutex poisoned"),
            Self::WorkerPanicked(msg) => write!(f, "worker panicked: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use std::time::Duration;

    #[test]
    fn test_shutdown_waits_for_worker() {
        let exited = Arc::new(AtomicBool::new(false));
        let worker_exited = exited.clone();
        let handle = WorkerHandle::spawn("test-worker", move |token| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            worker_exited.store(true, Ordering::SeqCst);
        })
        .unwrap();

        assert!(!exited.load(Ordering::SeqCst));
        handle.shutdown().unwrap();
        assert!(exited.load(Ordering::SeqCst));

        // second shutdown has nothing left to join
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_reports_panics() {
        let handle = WorkerHandle::spawn("panicking-worker", |_| panic!("boom")).unwrap();
        assert_eq!(
            handle.shutdown(),
            Err(WorkerError::WorkerPanicked("boom".to_string()))
        );
    }

    #[test]
    fn test_drop_cancels_worker() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = WorkerHandle::spawn("dropped-worker", move |token| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            tx.send(()).unwrap();
        })
        .unwrap();
        drop(handle);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}

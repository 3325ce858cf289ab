//! Background task tracking for proxies
//!
//! A proxy spawns a notification pump and reply drivers; tracking their
//! handles here guarantees they stop when the proxy is dropped.

use parking_lot::Mutex;
use std::future::Future;
use tokio::task::JoinHandle;

/// Tracks tasks a proxy owns; aborts them on shutdown or drop.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        self.handles.lock().push(handle);
    }

    /// Abort every tracked task.
    pub fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

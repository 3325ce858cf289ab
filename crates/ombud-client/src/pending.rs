//! Single-resolution completion handles
//!
//! A [`PendingOperation`] represents an in-flight asynchronous action that
//! succeeds or fails exactly once. Listeners registered before completion
//! are invoked synchronously when the outcome lands; listeners registered
//! afterwards are replayed immediately with the cached outcome, so a
//! completion can never be missed.
//!
//! Handles are cheap clones of shared state: the issuer holds one clone to
//! complete, any number of composite operations hold clones to observe or
//! chain. Dropping every clone abandons the operation without cancelling
//! whatever remote call backs it; the reply is simply discarded on arrival.

use ombud_core::{ProxyError, ProxyResult};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;

/// Outcome delivered to listeners and `wait()` callers.
pub type Outcome<T> = Result<T, ProxyError>;

type Listener<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

enum State<T> {
    Pending(Vec<Listener<T>>),
    Done(Outcome<T>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

/// A completion handle that resolves exactly once.
pub struct PendingOperation<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for PendingOperation<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for PendingOperation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingOperation<T> {
    /// Create a handle in the Pending state.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending(Vec::new())),
                notify: Notify::new(),
            }),
        }
    }

    /// Whether the operation has settled.
    pub fn is_completed(&self) -> bool {
        matches!(&*self.shared.state.lock(), State::Done(_))
    }
}

impl<T: Clone> PendingOperation<T> {
    /// Create a handle that is already completed successfully.
    pub fn succeeded(value: T) -> Self {
        let pending = Self::new();
        let _ = pending.complete_success(value);
        pending
    }

    /// Create a handle that is already completed with `error`.
    pub fn failed(error: ProxyError) -> Self {
        let pending = Self::new();
        let _ = pending.complete_failure(error);
        pending
    }

    /// The cached outcome, if the operation has settled.
    pub fn peek(&self) -> Option<Outcome<T>> {
        match &*self.shared.state.lock() {
            State::Done(outcome) => Some(outcome.clone()),
            State::Pending(_) => None,
        }
    }

    /// Transition to Succeeded and deliver `value` to every listener.
    ///
    /// A second completion of either kind fails with
    /// [`ProxyError::AlreadyCompleted`].
    pub fn complete_success(&self, value: T) -> ProxyResult<()> {
        self.complete_with(Ok(value))
    }

    /// Transition to Failed and deliver `error` to every listener.
    pub fn complete_failure(&self, error: ProxyError) -> ProxyResult<()> {
        self.complete_with(Err(error))
    }

    /// Settle with an outcome produced elsewhere.
    pub fn complete_with(&self, outcome: Outcome<T>) -> ProxyResult<()> {
        // The outcome is stored before any listener runs, so a listener
        // that registers another listener (or inspects the handle) sees the
        // settled state; listeners themselves run outside the lock so they
        // may call back into this handle freely.
        let listeners = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Done(_) => return Err(ProxyError::AlreadyCompleted),
                State::Pending(listeners) => {
                    let drained = std::mem::take(listeners);
                    *state = State::Done(outcome.clone());
                    drained
                }
            }
        };
        for listener in listeners {
            listener(outcome.clone());
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Register a callback invoked exactly once with the outcome.
    ///
    /// If the operation already settled, the callback runs immediately with
    /// the cached outcome.
    pub fn on_complete<F>(&self, listener: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let outcome = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Pending(listeners) => {
                    listeners.push(Box::new(listener));
                    return;
                }
                State::Done(outcome) => outcome.clone(),
            }
        };
        listener(outcome);
    }

    /// Complete this handle with whatever outcome `other` settles with.
    ///
    /// Used to hand a caller one handle up front while the stages behind it
    /// are built incrementally. If this handle was settled elsewhere first,
    /// the adopted outcome is discarded.
    pub fn chain_from(&self, other: &PendingOperation<T>)
    where
        T: Send + 'static,
    {
        let target = self.clone();
        other.on_complete(move |outcome| {
            let _ = target.complete_with(outcome);
        });
    }

    /// Await the outcome.
    ///
    /// Purely observational: dropping the returned future abandons interest
    /// without affecting the operation.
    pub async fn wait(&self) -> Outcome<T> {
        loop {
            // Arm the notification before checking state so a completion
            // landing in between cannot be missed.
            let notified = self.shared.notify.notified();
            if let Some(outcome) = self.peek() {
                return outcome;
            }
            notified.await;
        }
    }
}

impl<T: Clone + Send + 'static> std::future::IntoFuture for PendingOperation<T> {
    type Output = Outcome<T>;
    type IntoFuture = futures::future::BoxFuture<'static, Outcome<T>>;

    /// `handle.await` is shorthand for `handle.wait().await` on an owned
    /// handle.
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

impl<T: Clone + Send + 'static> PendingOperation<T> {
    /// Drive a handle from a future, typically a remote call.
    ///
    /// The future runs to completion even if every clone of the returned
    /// handle is dropped; its outcome is then discarded.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        let pending = Self::new();
        let driver = pending.clone();
        tokio::spawn(async move {
            let _ = driver.complete_with(fut.await);
        });
        pending
    }
}

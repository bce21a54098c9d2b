//! Trailing-edge debounce for collapsing bursts of calls into one.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

pub type ActionFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Collapses rapid calls into a single action invocation carrying the most
/// recent payload. Every call restarts the delay window; the action runs
/// once the window elapses without another call.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    pending: Arc<Mutex<Option<T>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    action: Arc<dyn Fn(T) -> ActionFuture + Send + Sync + 'static>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> ActionFuture + Send + Sync + 'static,
    {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
            handle: Mutex::new(None),
            action: Arc::new(action),
        }
    }

    /// Schedule `value` to be delivered after the delay, replacing any
    /// payload still waiting. Must be called from within a tokio runtime.
    pub fn call(&self, value: T) {
        *self.pending.lock().unwrap() = Some(value);

        let mut guard = self.handle.lock().unwrap();
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let pending = self.pending.clone();
        let action = self.action.clone();
        let delay = self.delay;
        *guard = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            let value = pending.lock().unwrap().take();
            if let Some(value) = value {
                action(value).await;
            }
        }));
    }

    /// Drop any pending payload without firing.
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
        *self.pending.lock().unwrap() = None;
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }
}

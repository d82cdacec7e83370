//! A dedicated worker thread that dispatches client callbacks outside any
//! policy mutex — a slow client cannot stall the policy layer because
//! callbacks run on this worker instead of under the lock.

use crossbeam_channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};

/// Posts items of type `T` to a background thread, which hands each one to
/// a dispatch closure serially and in order. Dropping the worker closes
/// the channel; the thread drains remaining items, then exits.
pub struct CallbackWorker<T: Send + 'static> {
    tx: Sender<T>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> CallbackWorker<T> {
    /// Spawn the worker thread running `dispatch` for every posted item, in
    /// the order they were posted.
    pub fn new<F>(mut dispatch: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = unbounded::<T>();
        let handle = thread::spawn(move || {
            while let Ok(item) = rx.recv() {
                dispatch(item);
            }
        });
        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Enqueue an item for dispatch. Fire-and-forget: never blocks the
    /// caller waiting on the client.
    pub fn post(&self, item: T) {
        let _ = self.tx.send(item);
    }
}

impl<T: Send + 'static> Drop for CallbackWorker<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

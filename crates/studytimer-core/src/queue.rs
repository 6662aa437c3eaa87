//! Background delivery for blocking sinks.
//!
//! The timer driver calls recorders and notifiers inline. Sinks that block
//! (SQLite writes, desktop notification services) are wrapped so the call
//! only enqueues and a dedicated thread does the work, in order.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::warn;

pub(crate) struct Queue<T: Send + 'static> {
    tx: Option<mpsc::Sender<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Queue<T> {
    pub(crate) fn spawn<F>(name: &str, mut handle: F) -> std::io::Result<Self>
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<T>();
        let worker = thread::Builder::new()
            .name(format!("studytimer-{name}"))
            .spawn(move || {
                for item in rx {
                    handle(item);
                }
            })?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Enqueue `item`. Returns `false` if the worker has died.
    pub(crate) fn push(&self, item: T) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(item).is_ok())
    }
}

impl<T: Send + 'static> Drop for Queue<T> {
    /// Flush: close the channel and wait for queued items to be handled.
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("background sink worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn items_are_handled_in_order_and_flushed_on_drop() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let queue = Queue::spawn("test", move |n: u32| sink.lock().unwrap().push(n)).unwrap();
        for n in 0..5 {
            assert!(queue.push(n));
        }
        drop(queue);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}

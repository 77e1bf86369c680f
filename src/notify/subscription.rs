//! Cancellable push subscriptions.
//!
//! A [`Subscription`] owns the producer task that forwards server pushes and
//! the receiving end of the channel it forwards into. Dropping the handle or
//! calling [`Subscription::unsubscribe`] stops the producer.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Ordered stream of items pushed by a background producer.
#[derive(Debug)]
pub struct Subscription<T> {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawn `producer` on the runtime and subscribe to what it sends.
    ///
    /// The channel is unbounded so the producer never waits on the consumer
    /// and no item is dropped.
    pub fn spawn<F, Fut>(name: &'static str, producer: F) -> Self
    where
        F: FnOnce(mpsc::UnboundedSender<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(producer(tx));
        tracing::debug!(subscription = name, "Subscription started");
        Self {
            name,
            rx,
            task: Some(task),
        }
    }
}

impl<T> Subscription<T> {
    /// Wait for the next item. `None` once the producer has finished and
    /// every buffered item was consumed.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the producer and discard anything still buffered.
    pub fn unsubscribe(mut self) {
        self.cancel();
        tracing::debug!(subscription = self.name, "Unsubscribed");
    }

    fn cancel(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Simple stateless pub-sub event handler.
//!
//! Components subscribe to payment engine events (an order becoming paid, a payment failing) and
//! react to them without access to the engine's internal state. Handlers are async and run on
//! their own task; the reconciliation flow never waits on them.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Consumes events until the last producer is dropped, running the handler for each.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Drop the internal sender so the loop ends once every subscriber is gone.
        drop(self.sender);
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            (self.handler)(ev).await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn events_reach_the_handler() {
        let _ = env_logger::try_init();
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let handler: Handler<u64> = Arc::new(move |v| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(v, Ordering::SeqCst);
            })
        });
        let handler = EventHandler::new(8, handler);
        let producer = handler.subscribe();
        let running = tokio::spawn(handler.start_handler());
        producer.publish_event(3).await;
        producer.publish_event(4).await;
        drop(producer);
        running.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 7);
    }
}

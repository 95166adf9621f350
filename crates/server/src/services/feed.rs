//! Realtime catalog feed.
//!
//! Every catalog mutation publishes the full product list. Observers that
//! fall behind lose intermediate snapshots, which is harmless because each
//! snapshot supersedes the previous one.
//!
//! Publishers read and send under [`CatalogFeed::publishing`], so snapshots
//! leave in the order they were read and the last one out is never stale.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, broadcast};

use emporium_core::Product;

/// Snapshots buffered per observer before it starts lagging.
const FEED_CAPACITY: usize = 16;

/// A full catalog listing as sent to observers.
pub type Snapshot = Arc<Vec<Product>>;

/// Fan-out of catalog snapshots to connected observers.
#[derive(Clone)]
pub struct CatalogFeed {
    sender: broadcast::Sender<Snapshot>,
    publishing: Arc<Mutex<()>>,
}

impl Default for CatalogFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogFeed {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            sender,
            publishing: Arc::new(Mutex::new(())),
        }
    }

    /// Register a new observer. It only sees snapshots published afterwards.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// Hold this while reading a snapshot and publishing it.
    pub async fn publishing(&self) -> MutexGuard<'_, ()> {
        self.publishing.lock().await
    }

    /// Publish a snapshot; returns how many observers received it.
    ///
    /// Having no observers is not an error.
    pub fn publish(&self, products: Vec<Product>) -> usize {
        self.sender.send(Arc::new(products)).unwrap_or(0)
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

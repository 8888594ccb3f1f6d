//! Deduplication markers: "this client already counted this slug".

use std::sync::Arc;
use std::time::Duration;

use viewcount_core::error::Result;
use viewcount_core::{ClientId, Slug};

use crate::store::{CounterStore, KeySpace};

/// Lifetime of a dedup marker.
pub const MARKER_TTL: Duration = Duration::from_secs(60 * 60);

pub struct DedupTracker {
    store: Arc<dyn CounterStore>,
    keys: KeySpace,
}

impl DedupTracker {
    pub fn new(store: Arc<dyn CounterStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Whether a live marker exists for the pair.
    pub async fn is_counted(&self, client: &ClientId, slug: &Slug) -> Result<bool> {
        let marker = self.store.get(&self.keys.marker(client, slug)).await?;
        Ok(marker.is_some())
    }

    /// Record (or overwrite) the marker for the pair.
    pub async fn mark_counted(&self, client: &ClientId, slug: &Slug) -> Result<()> {
        self.store
            .set_ex(&self.keys.marker(client, slug), 1, MARKER_TTL)
            .await
    }

    /// Atomically create the marker. `true` means this call owns the view.
    pub async fn try_claim(&self, client: &ClientId, slug: &Slug) -> Result<bool> {
        self.store
            .set_nx_ex(&self.keys.marker(client, slug), 1, MARKER_TTL)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tracker() -> DedupTracker {
        DedupTracker::new(Arc::new(MemoryStore::new()), KeySpace::default())
    }

    #[tokio::test(start_paused = true)]
    async fn marker_lives_for_one_hour() {
        let t = tracker();
        let client = ClientId::from("1.2.3.4");
        let slug = Slug::parse("hello-world", 64).unwrap();

        assert!(!t.is_counted(&client, &slug).await.unwrap());
        t.mark_counted(&client, &slug).await.unwrap();
        assert!(t.is_counted(&client, &slug).await.unwrap());

        tokio::time::advance(MARKER_TTL - Duration::from_secs(1)).await;
        assert!(t.is_counted(&client, &slug).await.unwrap());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!t.is_counted(&client, &slug).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn claim_is_exclusive_per_pair() {
        let t = tracker();
        let slug = Slug::parse("hello-world", 64).unwrap();
        let a = ClientId::from("1.2.3.4");
        let b = ClientId::from("5.6.7.8");

        assert!(t.try_claim(&a, &slug).await.unwrap());
        assert!(!t.try_claim(&a, &slug).await.unwrap());
        assert!(t.try_claim(&b, &slug).await.unwrap());
    }
}

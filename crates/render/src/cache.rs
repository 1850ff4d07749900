//! Preview sprite-sheet cache.
//!
//! One slot per sheet index. A slot is either absent, in flight, ready or
//! failed; entries are never evicted, so memory is bounded by the number of
//! sheets the metadata declares. Concurrent requests for a sheet that is
//! already in flight wait on the same fetch instead of starting another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrubkit_common::error::{ScrubError, ScrubResult};
use tokio::sync::watch;

use crate::source::AssetSource;
use crate::sprite::{load_sprite, SharedSprite};

/// Observable state of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetState {
    Absent,
    InFlight,
    Ready,
    Failed,
}

enum SheetSlot {
    /// Flips to `true` once the fetch has settled.
    InFlight(watch::Receiver<bool>),
    Ready(SharedSprite),
    Failed(String),
}

enum Claim {
    Wait(watch::Receiver<bool>),
    Fetch(watch::Sender<bool>),
}

/// Loads preview sheets by index and remembers the outcome.
pub struct SheetLoader {
    source: Arc<dyn AssetSource>,
    prefix: String,
    num_sheets: usize,
    slots: Mutex<HashMap<usize, SheetSlot>>,
}

impl SheetLoader {
    /// `prefix` is the preview sprite prefix; sheet `n` lives at
    /// `{prefix}-{n}.jpg`.
    pub fn new(source: Arc<dyn AssetSource>, prefix: impl Into<String>, num_sheets: usize) -> Self {
        Self {
            source,
            prefix: prefix.into(),
            num_sheets,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn num_sheets(&self) -> usize {
        self.num_sheets
    }

    pub fn location(&self, index: usize) -> String {
        format!("{}-{index}.jpg", self.prefix)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<usize, SheetSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, index: usize) -> SheetState {
        match self.slots().get(&index) {
            None => SheetState::Absent,
            Some(SheetSlot::InFlight(_)) => SheetState::InFlight,
            Some(SheetSlot::Ready(_)) => SheetState::Ready,
            Some(SheetSlot::Failed(_)) => SheetState::Failed,
        }
    }

    /// The sheet, if it has already loaded.
    pub fn get(&self, index: usize) -> Option<SharedSprite> {
        match self.slots().get(&index) {
            Some(SheetSlot::Ready(sheet)) => Some(Arc::clone(sheet)),
            _ => None,
        }
    }

    /// Number of sheets currently loaded.
    pub fn loaded_count(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, SheetSlot::Ready(_)))
            .count()
    }

    /// Load sheet `index`, joining an in-flight fetch when there is one.
    ///
    /// A recorded failure is returned as-is without refetching; use
    /// [`retry_failed`](Self::retry_failed) to clear it.
    pub async fn ensure(&self, index: usize) -> ScrubResult<SharedSprite> {
        if index >= self.num_sheets {
            return Err(ScrubError::asset(
                self.location(index),
                format!("sheet {index} out of range (0..{})", self.num_sheets),
            ));
        }

        loop {
            let claim = {
                let mut slots = self.slots();
                match slots.get(&index) {
                    Some(SheetSlot::Ready(sheet)) => return Ok(Arc::clone(sheet)),
                    Some(SheetSlot::Failed(message)) => {
                        return Err(ScrubError::asset(self.location(index), message.clone()))
                    }
                    Some(SheetSlot::InFlight(rx)) => Claim::Wait(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(false);
                        slots.insert(index, SheetSlot::InFlight(rx));
                        Claim::Fetch(tx)
                    }
                }
            };

            match claim {
                Claim::Fetch(tx) => return self.fetch(index, tx).await,
                Claim::Wait(mut rx) => {
                    if rx.wait_for(|settled| *settled).await.is_err() {
                        // The fetching task was dropped before it settled.
                        let mut slots = self.slots();
                        if matches!(slots.get(&index), Some(SheetSlot::InFlight(_))) {
                            slots.remove(&index);
                        }
                    }
                }
            }
        }
    }

    async fn fetch(&self, index: usize, done: watch::Sender<bool>) -> ScrubResult<SharedSprite> {
        let location = self.location(index);
        tracing::debug!(sheet = index, %location, "Fetching preview sheet");

        let result = load_sprite(self.source.as_ref(), &location).await;

        let outcome = {
            let mut slots = self.slots();
            match result {
                Ok(sheet) => {
                    let sheet = Arc::new(sheet);
                    slots.insert(index, SheetSlot::Ready(Arc::clone(&sheet)));
                    Ok(sheet)
                }
                Err(e) => {
                    tracing::warn!(sheet = index, %location, error = %e, "Preview sheet failed to load");
                    slots.insert(index, SheetSlot::Failed(e.to_string()));
                    Err(e)
                }
            }
        };

        done.send_replace(true);
        outcome
    }

    /// Forget a recorded failure so the next request fetches again.
    /// Returns whether there was a failure to clear.
    pub fn retry_failed(&self, index: usize) -> bool {
        let mut slots = self.slots();
        if matches!(slots.get(&index), Some(SheetSlot::Failed(_))) {
            slots.remove(&index);
            tracing::info!(sheet = index, "Cleared failed preview sheet for retry");
            return true;
        }
        false
    }

    /// Clear every recorded failure. Returns the cleared indices.
    pub fn retry_all_failed(&self) -> Vec<usize> {
        let mut slots = self.slots();
        let mut failed: Vec<usize> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, SheetSlot::Failed(_)))
            .map(|(index, _)| *index)
            .collect();
        failed.sort_unstable();
        for index in &failed {
            slots.remove(index);
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryAssetSource;
    use crate::test_support::encoded_sheet;
    use std::time::Duration;

    fn loader(source: Arc<MemoryAssetSource>, sheets: usize) -> SheetLoader {
        SheetLoader::new(source, "mem/rec-preview", sheets)
    }

    #[tokio::test]
    async fn test_ensure_caches_after_first_fetch() {
        let source = Arc::new(MemoryAssetSource::new());
        source.insert("mem/rec-preview-0.jpg", encoded_sheet(8, 4, [10, 20, 30]));
        let loader = loader(source.clone(), 1);

        assert_eq!(loader.state(0), SheetState::Absent);
        let sheet = loader.ensure(0).await.unwrap();
        assert_eq!((sheet.width(), sheet.height()), (8, 4));
        loader.ensure(0).await.unwrap();

        assert_eq!(loader.state(0), SheetState::Ready);
        assert_eq!(source.fetch_count("mem/rec-preview-0.jpg"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let source = Arc::new(MemoryAssetSource::with_latency(Duration::from_millis(20)));
        source.insert("mem/rec-preview-1.jpg", encoded_sheet(4, 4, [0, 0, 0]));
        let loader = Arc::new(loader(source.clone(), 2));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let loader = Arc::clone(&loader);
                tokio::spawn(async move { loader.ensure(1).await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(source.fetch_count("mem/rec-preview-1.jpg"), 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_not_retried() {
        let source = Arc::new(MemoryAssetSource::new());
        let loader = loader(source.clone(), 3);

        assert!(loader.ensure(2).await.is_err());
        assert!(loader.ensure(2).await.is_err());
        assert_eq!(loader.state(2), SheetState::Failed);
        assert_eq!(source.fetch_count("mem/rec-preview-2.jpg"), 1);

        source.insert("mem/rec-preview-2.jpg", encoded_sheet(4, 4, [1, 2, 3]));
        assert!(loader.retry_failed(2));
        assert!(loader.ensure(2).await.is_ok());
        assert_eq!(source.fetch_count("mem/rec-preview-2.jpg"), 2);
    }

    #[tokio::test]
    async fn test_undecodable_sheet_fails() {
        let source = Arc::new(MemoryAssetSource::new());
        source.insert("mem/rec-preview-0.jpg", b"not an image".to_vec());
        let loader = loader(source, 1);
        assert!(loader.ensure(0).await.is_err());
        assert_eq!(loader.state(0), SheetState::Failed);
    }

    #[tokio::test]
    async fn test_out_of_range_index() {
        let source = Arc::new(MemoryAssetSource::new());
        let loader = loader(source.clone(), 2);
        assert!(loader.ensure(5).await.is_err());
        assert_eq!(source.total_fetches(), 0);
        assert_eq!(loader.state(5), SheetState::Absent);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_does_not_wedge_waiters() {
        let source = Arc::new(MemoryAssetSource::with_latency(Duration::from_millis(50)));
        source.insert("mem/rec-preview-0.jpg", encoded_sheet(4, 4, [9, 9, 9]));
        let loader = Arc::new(loader(source.clone(), 1));

        let first = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.ensure(0).await.is_ok() })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        first.abort();
        let _ = first.await;

        assert!(loader.ensure(0).await.is_ok());
        assert_eq!(source.fetch_count("mem/rec-preview-0.jpg"), 2);
    }
}

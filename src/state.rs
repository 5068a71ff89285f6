//! Current-dataset slot shared by the HTTP handlers.
//!
//! The slot holds at most one [`LoadedDataset`]. An upload swaps the whole
//! `Arc` under the write lock, so a reader either sees the previous dataset or
//! the new one, never a mix. Every swap bumps the generation.

use std::sync::Arc;

use serde::Serialize;
use ticketlens_core::{Dataset, QueryError};
use tokio::sync::RwLock;
use tracing::info;

/// A dataset together with the upload generation that produced it.
#[derive(Debug)]
pub struct LoadedDataset {
    pub generation: u64,
    pub dataset: Dataset,
}

/// Snapshot of the slot for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub generation: Option<u64>,
    pub tickets: usize,
}

#[derive(Debug, Default)]
pub struct DatasetStore {
    current: RwLock<Option<Arc<LoadedDataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `dataset` as current and return it with its new generation.
    pub async fn replace(&self, dataset: Dataset) -> Arc<LoadedDataset> {
        let mut slot = self.current.write().await;
        let generation = slot.as_ref().map_or(1, |c| c.generation + 1);
        let loaded = Arc::new(LoadedDataset {
            generation,
            dataset,
        });
        *slot = Some(Arc::clone(&loaded));
        info!(generation, tickets = loaded.dataset.len(), "dataset replaced");
        loaded
    }

    /// The current dataset, or [`QueryError::EmptyDataset`] before the first upload.
    pub async fn current(&self) -> Result<Arc<LoadedDataset>, QueryError> {
        self.current
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(QueryError::EmptyDataset)
    }

    pub async fn status(&self) -> SlotStatus {
        match self.current.read().await.as_ref() {
            Some(loaded) => SlotStatus {
                generation: Some(loaded.generation),
                tickets: loaded.dataset.len(),
            },
            None => SlotStatus {
                generation: None,
                tickets: 0,
            },
        }
    }
}

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use localrag_core::error::{Error, Result};
use tracing::info;

use crate::store::VectorStore;

/// The process's single active index.
///
/// Readers take a cheap `Arc` snapshot and search without holding the lock;
/// a rebuild swaps in a whole new store, so a query sees either the old or
/// the new index, never a mix. Last write wins.
#[derive(Debug, Default)]
pub struct StoreHandle {
    inner: RwLock<Option<Arc<VectorStore>>>,
}

impl StoreHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current store, or `IndexNotLoaded`.
    pub fn get(&self) -> Result<Arc<VectorStore>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::IndexNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn replace(&self, store: VectorStore) -> Arc<VectorStore> {
        let store = Arc::new(store);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&store));
        store
    }

    /// Read the persisted index from `dir` and make it the active one.
    pub fn load(&self, dir: &Path) -> Result<Arc<VectorStore>> {
        let store = VectorStore::load(dir)?;
        info!(dir = %dir.display(), entries = store.len(), dim = store.dim(), "index loaded");
        Ok(self.replace(store))
    }

    /// Return the active store, loading it from `dir` on first use.
    /// A missing index on disk surfaces as `IndexNotLoaded`.
    pub fn ensure_loaded(&self, dir: &Path) -> Result<Arc<VectorStore>> {
        if let Ok(store) = self.get() {
            return Ok(store);
        }
        match self.load(dir) {
            Err(Error::IndexNotFound(_)) => Err(Error::IndexNotLoaded),
            other => other,
        }
    }

    pub fn unload(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

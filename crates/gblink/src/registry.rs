//! Handle registries: opaque ids standing in for object pointers.
//!
//! Ids are monotonic and never reused, so a stale handle after a free
//! resolves to nothing instead of silently aliasing a newer object. Id 0 is
//! reserved as the null handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ProxySlot;
use crate::data::Dataset;
use crate::learner::Learner;
use crate::staging::ReturnBuffers;

/// Opaque dataset handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetHandle(pub u64);

/// Opaque model handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub u64);

/// Dataset storage state. Proxies hold at most one staged batch; every
/// other operation requires materialized data.
#[derive(Debug)]
pub enum DatasetState {
    Ready(Arc<Dataset>),
    Proxy(ProxySlot),
}

/// Registry entry for a dataset handle.
#[derive(Debug)]
pub struct DatasetEntry {
    pub state: DatasetState,
    pub buffers: ReturnBuffers,
}

impl DatasetEntry {
    pub fn ready(dataset: Arc<Dataset>) -> Self {
        Self { state: DatasetState::Ready(dataset), buffers: ReturnBuffers::default() }
    }

    pub fn proxy() -> Self {
        Self {
            state: DatasetState::Proxy(ProxySlot::default()),
            buffers: ReturnBuffers::default(),
        }
    }
}

/// Registry entry for a model handle.
#[derive(Debug)]
pub struct ModelEntry {
    pub learner: Learner,
    pub buffers: ReturnBuffers,
}

impl ModelEntry {
    pub fn new(learner: Learner) -> Self {
        Self { learner, buffers: ReturnBuffers::default() }
    }
}

/// Id-to-entry map with never-reused monotonic ids.
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<u64, T>,
    next: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        // Start at 1; id 0 is the null handle.
        Self { entries: HashMap::new(), next: 1 }
    }
}

impl<T> Registry<T> {
    pub fn insert(&mut self, entry: T) -> u64 {
        let id = self.next;
        self.next += 1;
        self.entries.insert(id, entry);
        id
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_never_reused() {
        let mut registry: Registry<u32> = Registry::default();
        let first = registry.insert(10);
        assert_eq!(first, 1);
        registry.remove(first);
        let second = registry.insert(20);
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert_eq!(registry.get(second), Some(&20));
    }

    #[test]
    fn zero_is_never_issued() {
        let mut registry: Registry<u32> = Registry::default();
        for _ in 0..8 {
            assert_ne!(registry.insert(0), 0);
        }
    }
}

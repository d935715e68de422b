use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::{ContentId, StoreError};
use crate::ports::ContentStore;

/// In-memory content store.
///
/// Backs tests and embedders that keep content in process memory.
#[derive(Default)]
pub struct InMemoryContentStore {
    data: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, id: &ContentId, value: &[u8]) -> Result<(), StoreError> {
        self.data.write().insert(*id, value.to_vec());
        Ok(())
    }

    fn get(&self, id: &ContentId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().get(id).cloned())
    }

    fn contains(&self, id: &ContentId) -> Result<bool, StoreError> {
        Ok(self.data.read().contains_key(id))
    }
}

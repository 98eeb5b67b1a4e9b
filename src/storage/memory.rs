use std::cell::{Cell, RefCell};

use crate::{
    models::store::Store,
    storage::{Storage, StorageError},
};

/// Storage kept in memory, recording how many times it was saved.
#[derive(Default)]
pub struct MemoryStorage {
    store: RefCell<Store>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
    fail_loads: Cell<bool>,
}

impl MemoryStorage {
    pub fn with_store(store: Store) -> Self {
        Self {
            store: RefCell::new(store),
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Store {
        self.store.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.set(fail);
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Store, StorageError> {
        if self.fail_loads.get() {
            return Err(StorageError::LoadFailed {
                path: "<memory>".into(),
                source: std::io::Error::other("storage unavailable"),
            });
        }
        Ok(self.store.borrow().clone())
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        if self.fail_saves.get() {
            return Err(StorageError::SaveFailed {
                path: "<memory>".into(),
                source: std::io::Error::other("storage quota exceeded"),
            });
        }
        *self.store.borrow_mut() = store.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

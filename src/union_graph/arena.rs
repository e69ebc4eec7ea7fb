//! Append-only element storage shared between inserting workers.

use std::sync::{Mutex, PoisonError, RwLock};

/// Elements live behind their own mutex so fusing into one never blocks
/// fusing into another. Appends take the arena write lock.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    items: RwLock<Vec<Mutex<T>>>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.items_mut().reserve(additional);
    }

    /// Append `item` and return its index.
    pub fn push(&self, item: T) -> u32 {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let index = items.len() as u32;
        items.push(Mutex::new(item));
        index
    }

    /// Run `f` on the element at `index` while holding its lock.
    pub fn with<R>(&self, index: u32, f: impl FnOnce(&mut T) -> R) -> R {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut item = items[index as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut item)
    }

    #[inline]
    fn items_mut(&mut self) -> &mut Vec<Mutex<T>> {
        self.items.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len_mut(&mut self) -> usize {
        self.items_mut().len()
    }

    pub fn push_mut(&mut self, item: T) -> u32 {
        let items = self.items_mut();
        let index = items.len() as u32;
        items.push(Mutex::new(item));
        index
    }

    pub fn get_mut(&mut self, index: u32) -> &mut T {
        self.items_mut()[index as usize]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}

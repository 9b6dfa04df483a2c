use std::collections::HashMap;

/// Module instances keyed by opaque non-zero `u64` handles. Foreign callers
/// keep the handle and pass it back on every call.
pub struct HandleStore<T> {
    items: HashMap<u64, T>,
    /// Next handle to issue. Never reused, so a stale handle cannot alias a new instance.
    next: u64,
}

impl<T> HandleStore<T> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next: 1,
        }
    }

    pub fn insert(&mut self, item: T) -> u64 {
        let handle = self.next;
        self.next += 1;
        self.items.insert(handle, item);
        handle
    }

    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        self.items.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: u64) -> Option<T> {
        self.items.remove(&handle)
    }

    pub fn live(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one() {
        let mut store = HandleStore::new();
        assert_eq!(store.insert("a"), 1);
        assert_eq!(store.insert("b"), 2);
        assert_eq!(store.get_mut(2).map(|s| *s), Some("b"));
    }

    #[test]
    fn test_removed_handle_not_reissued() {
        let mut store = HandleStore::new();
        let a = store.insert(1);
        assert_eq!(store.remove(a), Some(1));
        assert!(store.get_mut(a).is_none());
        assert_eq!(store.live(), 0);
        assert_ne!(store.insert(2), a);
    }
}

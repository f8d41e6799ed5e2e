//! Generic object pool for reusable instances.
//!
//! Borrowed instances are moved out to the caller and moved back on return,
//! so the same instance cannot be handed back twice. The pool tracks which
//! keys are out; an item whose key was never borrowed is refused.

use std::collections::HashSet;
use std::hash::Hash;

/// Something the pool can hand out and take back.
pub trait Poolable {
    type Key: Copy + Eq + Hash + std::fmt::Debug;

    /// Stable identity of this instance for the lifetime of the pool.
    fn pool_key(&self) -> Self::Key;

    /// Restore a returned instance to its idle state.
    fn reset(&mut self) {}
}

/// Grows on demand; never shrinks.
pub struct Pool<T: Poolable> {
    free: Vec<T>,
    borrowed: HashSet<T::Key>,
    factory: Box<dyn FnMut(usize) -> T>,
    created: usize,
}

impl<T: Poolable> Pool<T> {
    /// Create a pool and pre-populate it with `initial_count` instances.
    /// The factory receives the running creation index.
    pub fn initialize(factory: impl FnMut(usize) -> T + 'static, initial_count: usize) -> Self {
        let mut pool = Self {
            free: Vec::with_capacity(initial_count),
            borrowed: HashSet::new(),
            factory: Box::new(factory),
            created: 0,
        };
        for _ in 0..initial_count {
            let item = pool.create();
            pool.free.push(item);
        }
        pool
    }

    /// Take a free instance, or create one if none are free.
    pub fn borrow(&mut self) -> T {
        let item = match self.free.pop() {
            Some(item) => item,
            None => self.create(),
        };
        self.borrowed.insert(item.pool_key());
        item
    }

    /// Give an instance back. Items this pool did not lend out are refused
    /// and handed back to the caller.
    pub fn return_item(&mut self, mut item: T) -> Result<(), T> {
        if !self.borrowed.remove(&item.pool_key()) {
            log::warn!("pool refused {:?}: not currently borrowed", item.pool_key());
            return Err(item);
        }
        item.reset();
        self.free.push(item);
        Ok(())
    }

    pub fn is_borrowed(&self, key: T::Key) -> bool {
        self.borrowed.contains(&key)
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn borrowed_count(&self) -> usize {
        self.borrowed.len()
    }

    /// Instances ever created by this pool.
    pub fn created_count(&self) -> usize {
        self.created
    }

    fn create(&mut self) -> T {
        let item = (self.factory)(self.created);
        self.created += 1;
        item
    }
}

impl<T: Poolable> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("free", &self.free.len())
            .field("borrowed", &self.borrowed.len())
            .field("created", &self.created)
            .finish()
    }
}

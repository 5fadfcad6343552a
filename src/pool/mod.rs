//! Recycling of spawned instances.
//!
//! [`ActiveEntityPool`] owns every object it ever created, callers only hold [`PoolHandle`]s. Released
//! objects go onto a LIFO free list, so the most recently used (and thus warmest) object is handed
//! out first.

pub mod instances;

use crate::scene::node::Disposable;
use log::{debug, warn};
use std::fmt::{Debug, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: usize,
    epoch: u32,
}

impl PoolHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub total: usize,
}

impl std::ops::Add for PoolStats {
    type Output = PoolStats;

    fn add(self, rhs: Self) -> Self::Output {
        PoolStats {
            available: self.available + rhs.available,
            in_use: self.in_use + rhs.in_use,
            total: self.total + rhs.total,
        }
    }
}

struct PooledEntry<T> {
    object: T,
    in_use: bool,
}

pub struct ActiveEntityPool<T> {
    name: String,
    entries: Vec<PooledEntry<T>>,
    available: Vec<usize>,
    factory: Box<dyn FnMut() -> T>,
    reset: Option<Box<dyn FnMut(&mut T)>>,
    /// Bumped on dispose, which invalidates every outstanding handle.
    epoch: u32,
}

impl<T> Debug for ActiveEntityPool<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEntityPool")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl<T> ActiveEntityPool<T> {
    pub fn new(name: impl Into<String>, factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            available: Vec::new(),
            factory: Box::new(factory),
            reset: None,
            epoch: 0,
        }
    }

    /// Runs `reset` on every object that is released back into the pool.
    pub fn with_reset(mut self, reset: impl FnMut(&mut T) + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Pre-warms the pool with `size` objects (counting the ones that already exist).
    pub fn with_initial_size(mut self, size: usize) -> Self {
        while self.entries.len() < size {
            let object = (self.factory)();
            self.available.push(self.entries.len());
            self.entries.push(PooledEntry { object, in_use: false });
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acquire(&mut self) -> PoolHandle {
        let index = match self.available.pop() {
            Some(index) => {
                self.entries[index].in_use = true;
                index
            }
            None => {
                let object = (self.factory)();
                self.entries.push(PooledEntry { object, in_use: true });
                self.entries.len() - 1
            }
        };

        PoolHandle {
            index,
            epoch: self.epoch,
        }
    }

    fn entry(&self, handle: PoolHandle) -> Option<&PooledEntry<T>> {
        if handle.epoch != self.epoch {
            return None;
        }

        self.entries.get(handle.index).filter(|entry| entry.in_use)
    }

    pub fn is_in_use(&self, handle: PoolHandle) -> bool {
        self.entry(handle).is_some()
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.entry(handle).map(|entry| &entry.object)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if !self.is_in_use(handle) {
            return None;
        }

        self.entries.get_mut(handle.index).map(|entry| &mut entry.object)
    }

    /// Hands the object behind `handle` back. Releasing something that isn't in use (twice, or with a
    /// handle from before a dispose) is reported and otherwise ignored.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        if !self.is_in_use(handle) {
            warn!(
                "Pool {}: Tried to release {:?}, which is not in use. Ignoring.",
                self.name, handle
            );
            return false;
        }

        let entry = &mut self.entries[handle.index];
        if let Some(reset) = self.reset.as_mut() {
            reset(&mut entry.object);
        }

        entry.in_use = false;
        self.available.push(handle.index);
        true
    }

    pub fn release_all(&mut self) -> usize {
        let in_use = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.in_use)
            .map(|(index, _)| PoolHandle {
                index,
                epoch: self.epoch,
            })
            .collect::<Vec<_>>();

        in_use.into_iter().filter(|handle| self.release(*handle)).count()
    }

    /// Tears down every object, in use or not, with `hook`. The pool stays usable afterwards, but all
    /// previously handed out handles are stale.
    pub fn dispose_with(&mut self, mut hook: impl FnMut(&mut T)) {
        if !self.entries.is_empty() {
            debug!("Pool {}: Disposing {} objects", self.name, self.entries.len());
        }

        for entry in self.entries.iter_mut() {
            hook(&mut entry.object);
        }

        self.entries.clear();
        self.available.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            in_use: self.entries.len() - self.available.len(),
            total: self.entries.len(),
        }
    }

    pub fn iter_in_use(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.in_use)
            .map(|(index, entry)| {
                (
                    PoolHandle {
                        index,
                        epoch: self.epoch,
                    },
                    &entry.object,
                )
            })
    }
}

impl<T: Disposable> ActiveEntityPool<T> {
    pub fn dispose(&mut self) {
        self.dispose_with(T::dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_pool() -> ActiveEntityPool<u32> {
        let counter = Rc::new(Cell::new(0));
        ActiveEntityPool::new("numbers", move || {
            counter.set(counter.get() + 1);
            counter.get()
        })
    }

    #[test]
    fn prewarmed_objects_are_available() {
        let pool = counting_pool().with_initial_size(4);
        assert_eq!(
            pool.stats(),
            PoolStats {
                available: 4,
                in_use: 0,
                total: 4
            }
        );
    }

    #[test]
    fn reset_hook_runs_on_release() {
        let mut pool = ActiveEntityPool::new("numbers", || 5u32).with_reset(|value| *value = 0);
        let handle = pool.acquire();
        assert_eq!(pool.get(handle), Some(&5));
        assert!(pool.release(handle));

        let handle = pool.acquire();
        assert_eq!(pool.get(handle), Some(&0));
    }

    #[test]
    fn released_handles_give_no_access() {
        let mut pool = counting_pool();
        let handle = pool.acquire();
        pool.release(handle);
        assert!(pool.get(handle).is_none());
        assert!(pool.get_mut(handle).is_none());
    }

    #[test]
    fn dispose_invalidates_handles() {
        let disposed = Rc::new(Cell::new(0));
        let mut pool = counting_pool();
        let first = pool.acquire();
        let second = pool.acquire();
        pool.release(second);

        let counter = disposed.clone();
        pool.dispose_with(move |_| counter.set(counter.get() + 1));
        assert_eq!(disposed.get(), 2);
        assert_eq!(pool.stats(), PoolStats::default());
        assert!(!pool.release(first));

        // disposing twice is fine
        pool.dispose_with(|_| {});
        let handle = pool.acquire();
        assert_ne!(handle, first);
    }

    #[test]
    fn release_all_returns_everything() {
        let mut pool = counting_pool();
        for _ in 0..5 {
            pool.acquire();
        }
        assert_eq!(pool.release_all(), 5);
        assert_eq!(pool.stats().available, 5);
        assert_eq!(pool.iter_in_use().count(), 0);
    }
}

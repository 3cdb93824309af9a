use std::fmt;
use std::marker::PhantomData;

/// Typed index into a [`Pool`].
///
/// Handles are cheap to copy and compare by identity. A default handle is
/// invalid and never refers to a live entry. The generation counter guards
/// against use of a handle whose slot has been recycled.
pub struct Handle<T> {
    index: u16,
    generation: u16,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const INVALID_INDEX: u16 = u16::MAX;

    pub fn valid(&self) -> bool {
        self.index != Self::INVALID_INDEX
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Handle {
            index: Self::INVALID_INDEX,
            generation: 0,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

/// Generational arena owning every entry of one resource category.
///
/// Entries are inserted lazily and live until [`Pool::release`] or
/// [`Pool::drain`]. There is no per-entry destructor; callers that track GPU
/// objects release them through the drain at teardown.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u16>,
    len: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Pool {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
                _marker: PhantomData,
            };
        }

        let index = self.slots.len() as u16;
        assert!(index < Handle::<T>::INVALID_INDEX, "pool exhausted");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Remove every live entry, yielding each exactly once.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u16);
                values.push(value);
            }
        }
        self.len = 0;
        values
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut pool = Pool::new();
        let a = pool.insert(10u32);
        let b = pool.insert(20u32);
        assert_eq!(pool.get(a), Some(&10));
        assert_eq!(pool.get(b), Some(&20));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn released_handles_go_stale() {
        let mut pool = Pool::new();
        let a = pool.insert(1u32);
        assert_eq!(pool.release(a), Some(1));
        assert_eq!(pool.get(a), None);

        // The slot is recycled under a new generation.
        let b = pool.insert(2u32);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert_eq!(pool.get(a), None);
        assert_eq!(pool.get(b), Some(&2));
    }

    #[test]
    fn drain_yields_each_entry_once() {
        let mut pool = Pool::new();
        pool.insert(1u32);
        pool.insert(2u32);
        pool.insert(3u32);
        let mut drained = pool.drain();
        drained.sort();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(pool.is_empty());
        assert!(pool.drain().is_empty());
    }

    #[test]
    fn default_handle_is_invalid() {
        let pool: Pool<u32> = Pool::new();
        let handle = Handle::<u32>::default();
        assert!(!handle.valid());
        assert_eq!(pool.get(handle), None);
    }
}

//! Dense per-element attributes keyed by topology handles

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A copyable handle that maps to a dense slot index.
pub trait CellHandle: Copy + Eq + fmt::Debug {
    fn index(self) -> usize;
}

/// A value per element, stored densely by handle index.
///
/// Reads past the end return the default value; writes grow the storage.
#[derive(Clone)]
pub struct Attribute<H, T> {
    values: Vec<T>,
    default: T,
    _handle: PhantomData<H>,
}

impl<H: CellHandle, T: Clone> Attribute<H, T> {
    /// Create an attribute with `len` slots set to `default`
    pub fn new(len: usize, default: T) -> Self {
        Self {
            values: vec![default.clone(); len],
            default,
            _handle: PhantomData,
        }
    }

    pub fn get(&self, handle: H) -> &T {
        self.values.get(handle.index()).unwrap_or(&self.default)
    }

    pub fn set(&mut self, handle: H, value: T) {
        *self.slot(handle) = value;
    }

    /// Reset every slot to the default and resize to `len`
    pub fn reset(&mut self, len: usize) {
        self.values.clear();
        self.values.resize(len, self.default.clone());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn slot(&mut self, handle: H) -> &mut T {
        let i = handle.index();
        if i >= self.values.len() {
            self.values.resize(i + 1, self.default.clone());
        }
        &mut self.values[i]
    }
}

impl<H: CellHandle, T: Clone> Index<H> for Attribute<H, T> {
    type Output = T;

    fn index(&self, handle: H) -> &T {
        self.get(handle)
    }
}

impl<H: CellHandle, T: Clone> IndexMut<H> for Attribute<H, T> {
    fn index_mut(&mut self, handle: H) -> &mut T {
        self.slot(handle)
    }
}

impl<H, T: fmt::Debug> fmt::Debug for Attribute<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("len", &self.values.len())
            .field("default", &self.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Slot(usize);

    impl CellHandle for Slot {
        fn index(self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_reads_past_end_return_default() {
        let attr: Attribute<Slot, f64> = Attribute::new(2, 7.0);
        assert_eq!(attr[Slot(1)], 7.0);
        assert_eq!(attr[Slot(10)], 7.0);
        assert_eq!(attr.len(), 2);
    }

    #[test]
    fn test_writes_grow_storage() {
        let mut attr: Attribute<Slot, Option<u32>> = Attribute::new(0, None);
        assert!(attr.is_empty());
        attr[Slot(4)] = Some(3);
        assert_eq!(attr.len(), 5);
        assert_eq!(attr[Slot(4)], Some(3));
        assert_eq!(attr[Slot(2)], None);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut attr = Attribute::new(3, 0.0);
        attr.set(Slot(0), 1.5);
        attr.reset(5);
        assert_eq!(attr.len(), 5);
        assert_eq!(*attr.get(Slot(0)), 0.0);
    }
}

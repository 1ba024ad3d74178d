//! Indexed binary min-heap over topology cells
//!
//! The heap orders handles by an externally owned cost attribute and keeps
//! a position map from handle to heap slot, so that any element (not only
//! the root) can be removed or re-sifted after its cost changed.

use crate::attribute::{Attribute, CellHandle};
use crate::topology::VertexId;

const NOT_IN_HEAP: usize = usize::MAX;

/// Binary min-heap of cells ordered by `cost[cell]`.
///
/// Methods that reorder take the cost attribute by reference; the caller
/// owns it and must call [`MapCellHeap::update_cost`] after changing the
/// cost of a cell that is in the heap.
#[derive(Debug, Clone)]
pub struct MapCellHeap<C> {
    heap: Vec<C>,
    pos: Vec<usize>,
}

/// Heap of vertices, the one the decimator uses.
pub type MapVertexHeap = MapCellHeap<VertexId>;

#[inline]
fn father(i: usize) -> usize {
    (i + 1) / 2 - 1
}

#[inline]
fn child0(i: usize) -> usize {
    2 * (i + 1) - 1
}

#[inline]
fn child1(i: usize) -> usize {
    2 * (i + 1)
}

impl<C: CellHandle> MapCellHeap<C> {
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            pos: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            pos: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pos.clear();
    }

    /// The current minimum, without removing it
    pub fn peek(&self) -> Option<C> {
        self.heap.first().copied()
    }

    /// Heap array in storage order
    pub fn as_slice(&self) -> &[C] {
        &self.heap
    }

    /// O(1) membership test.
    ///
    /// A recorded position only counts if the slot still holds `cell`, so
    /// positions left behind by removals are never trusted.
    pub fn contains(&self, cell: C) -> bool {
        match self.pos.get(cell.index()) {
            Some(&p) => p < self.heap.len() && self.heap[p] == cell,
            None => false,
        }
    }

    /// Insert `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is already in the heap.
    pub fn push(&mut self, cell: C, cost: &Attribute<C, f64>) {
        assert!(!self.contains(cell), "{cell:?} is already in the heap");
        let i = self.heap.len();
        self.heap.push(cell);
        self.set_pos(cell, i);
        self.place_up(i, cost);
    }

    /// Remove and return the cell with the smallest cost.
    pub fn pop(&mut self, cost: &Attribute<C, f64>) -> Option<C> {
        let root = self.peek()?;
        self.remove(root, cost);
        Some(root)
    }

    /// Remove an arbitrary cell.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not in the heap.
    pub fn remove(&mut self, cell: C, cost: &Attribute<C, f64>) {
        assert!(self.contains(cell), "{cell:?} is not in the heap");
        let i = self.pos[cell.index()];
        let last = self.heap.len() - 1;
        self.swap(i, last);
        self.heap.pop();
        self.pos[cell.index()] = NOT_IN_HEAP;
        if i < self.heap.len() {
            // The element moved into `i` may belong above or below it.
            let i = self.place_up(i, cost);
            self.place_down(i, cost);
        }
    }

    /// Restore heap order after the caller changed `cost[cell]`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not in the heap.
    pub fn update_cost(&mut self, cell: C, cost: &Attribute<C, f64>) {
        assert!(self.contains(cell), "{cell:?} is not in the heap");
        let i = self.pos[cell.index()];
        let i = self.place_up(i, cost);
        self.place_down(i, cost);
    }

    /// Check `cost[heap[father(i)]] <= cost[heap[i]]` for every non-root slot
    pub fn is_heap_ordered(&self, cost: &Attribute<C, f64>) -> bool {
        (1..self.heap.len()).all(|i| cost[self.heap[father(i)]] <= cost[self.heap[i]])
    }

    fn set_pos(&mut self, cell: C, i: usize) {
        let k = cell.index();
        if k >= self.pos.len() {
            self.pos.resize(k + 1, NOT_IN_HEAP);
        }
        self.pos[k] = i;
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        let (a, b) = (self.heap[i], self.heap[j]);
        self.pos[a.index()] = i;
        self.pos[b.index()] = j;
    }

    fn less(&self, i: usize, j: usize, cost: &Attribute<C, f64>) -> bool {
        cost[self.heap[i]].total_cmp(&cost[self.heap[j]]).is_lt()
    }

    fn place_up(&mut self, mut i: usize, cost: &Attribute<C, f64>) -> usize {
        while i > 0 {
            let f = father(i);
            if !self.less(i, f, cost) {
                break;
            }
            self.swap(i, f);
            i = f;
        }
        i
    }

    fn place_down(&mut self, mut i: usize, cost: &Attribute<C, f64>) -> usize {
        let n = self.heap.len();
        loop {
            let mut smallest = i;
            let (c0, c1) = (child0(i), child1(i));
            if c0 < n && self.less(c0, smallest, cost) {
                smallest = c0;
            }
            if c1 < n && self.less(c1, smallest, cost) {
                smallest = c1;
            }
            if smallest == i {
                return i;
            }
            self.swap(i, smallest);
            i = smallest;
        }
    }
}

impl<C: CellHandle> Default for MapCellHeap<C> {
    fn default() -> Self {
        Self::new()
    }
}

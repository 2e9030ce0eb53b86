//! Priority heaps and the commit schedule
//!
//! Creates and updates run in ascending priority so dependencies exist
//! before their dependents; deletes run in descending priority so
//! dependents go first. Entries of equal priority pop last-in-first-out.

use crate::priority::{PrioId, PriorityTree};
use crate::tree::CommitTree;
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Direction of a [`Heap`]
pub trait HeapOrder {
    /// Ordering of two priorities; `Less` pops first
    fn compare(a: u64, b: u64) -> Ordering;
}

/// Lowest priority first
#[derive(Debug)]
pub struct Ascending;

impl HeapOrder for Ascending {
    fn compare(a: u64, b: u64) -> Ordering {
        a.cmp(&b)
    }
}

/// Highest priority first
#[derive(Debug)]
pub struct Descending;

impl HeapOrder for Descending {
    fn compare(a: u64, b: u64) -> Ordering {
        b.cmp(&a)
    }
}

#[derive(Debug)]
struct Slot<T> {
    priority: u64,
    seq: u64,
    item: T,
}

/// Binary heap keyed by priority with a deterministic tie-break
#[derive(Debug)]
pub struct Heap<T, O> {
    slots: Vec<Slot<T>>,
    next_seq: u64,
    _order: PhantomData<O>,
}

pub type MinHeap<T> = Heap<T, Ascending>;
pub type MaxHeap<T> = Heap<T, Descending>;

impl<T, O: HeapOrder> Default for Heap<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O: HeapOrder> Heap<T, O> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_seq: 0,
            _order: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, priority: u64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.push(Slot { priority, seq, item });
        self.sift_up(self.slots.len() - 1);
    }

    /// Remove the next entry with its priority
    pub fn pop(&mut self) -> Option<(u64, T)> {
        if self.slots.is_empty() {
            return None;
        }
        let last = self.slots.len() - 1;
        self.slots.swap(0, last);
        let slot = self.slots.pop()?;
        if !self.slots.is_empty() {
            self.sift_down(0);
        }
        Some((slot.priority, slot.item))
    }

    /// Pop every entry in heap order
    pub fn drain(&mut self) -> impl Iterator<Item = (u64, T)> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    fn before(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.slots[a], &self.slots[b]);
        match O::compare(a.priority, b.priority) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => a.seq > b.seq,
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.before(i, parent) {
                break;
            }
            self.slots.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut first = i;
            if left < len && self.before(left, first) {
                first = left;
            }
            if right < len && self.before(right, first) {
                first = right;
            }
            if first == i {
                break;
            }
            self.slots.swap(i, first);
            i = first;
        }
    }
}

/// Priority groups split into the two execution queues
#[derive(Debug, Default)]
pub struct Schedule {
    pub set: MinHeap<PrioId>,
    pub delete: MaxHeap<PrioId>,
}

impl Schedule {
    /// Number of groups across both queues
    pub fn groups(&self) -> usize {
        self.set.len() + self.delete.len()
    }
}

/// Queue every priority group for execution
pub fn schedule(prio: &PriorityTree, tree: &CommitTree) -> Schedule {
    let mut queues = Schedule::default();
    enqueue(prio, tree, prio.root(), &mut queues);
    queues
}

fn enqueue(prio: &PriorityTree, tree: &CommitTree, id: PrioId, queues: &mut Schedule) {
    let node = prio.node(id);
    if tree.node(node.root).deleted() {
        queues.delete.push(node.priority, id);
    } else {
        queues.set.push(node.priority, id);
    }

    let (deleted, kept): (Vec<PrioId>, Vec<PrioId>) = node
        .children
        .iter()
        .copied()
        .partition(|c| tree.node(prio.node(*c).root).deleted());
    for child in deleted {
        enqueue(prio, tree, child, queues);
    }
    // Equal priorities pop newest first, so push in reverse to pop in
    // declaration order.
    for child in kept.into_iter().rev() {
        enqueue(prio, tree, child, queues);
    }
}

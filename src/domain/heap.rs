//! Binomial heap with in-place key updates
//!
//! The heap is a forest of binomial trees kept in a root list sorted by tree
//! order (rank). Tree nodes live in an arena of slots addressed by index;
//! parent, child and sibling links are slot indices. A table maps every
//! tracked item to the slot currently holding it, which is what makes
//! [`BinomialHeap::update`] possible.
//!
//! Items are tracked by value: two equal items cannot be in the heap at the
//! same time.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot<K, T> {
    key: K,
    item: T,
    order: usize,
    parent: Option<usize>,
    /// Head of the child list, children in decreasing order
    children: Option<usize>,
    next: Option<usize>,
    prev: Option<usize>,
}

impl<K, T> Slot<K, T> {
    fn new(key: K, item: T) -> Self {
        Self {
            key,
            item,
            order: 0,
            parent: None,
            children: None,
            next: None,
            prev: None,
        }
    }
}

/// A mergeable min-heap keyed by `K` with decrease-key support
#[derive(Debug, Clone)]
pub struct BinomialHeap<K, T> {
    slots: Vec<Slot<K, T>>,
    /// Slots released by `poll_min`, reused by `insert`
    free: Vec<usize>,
    /// Head of the root list, trees in increasing order
    roots: Option<usize>,
    handles: HashMap<T, usize>,
}

impl<K: Ord + Clone, T: Eq + Hash + Clone> Default for BinomialHeap<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, T: Eq + Hash + Clone> BinomialHeap<K, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: None,
            handles: HashMap::new(),
        }
    }

    /// Returns the number of tracked items
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_none()
    }

    /// Returns true if the item is in the heap
    pub fn contains(&self, item: &T) -> bool {
        self.handles.contains_key(item)
    }

    /// Returns the current key of an item
    pub fn key(&self, item: &T) -> Option<&K> {
        self.handles.get(item).map(|idx| &self.slots[*idx].key)
    }

    /// Inserts a new item
    ///
    /// Panics if the item is already tracked.
    pub fn insert(&mut self, item: T, key: K) {
        assert!(!self.handles.contains_key(&item), "item is already in the heap");

        let slot = Slot::new(key, item.clone());
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        self.roots = self.merge(self.roots, Some(idx));
        self.handles.insert(item, idx);
    }

    /// Changes the key of a tracked item and restores the heap order
    ///
    /// The item is rotated to the root of its tree by moving the payloads of
    /// its ancestors one level down, then the root is detached and both the
    /// root and its former children are merged back into the forest. This
    /// works for keys that grow as well as for keys that shrink.
    ///
    /// Panics if the item is not tracked.
    pub fn update(&mut self, item: &T, key: K) {
        let Some(&start) = self.handles.get(item) else {
            panic!("item is not in the heap");
        };

        let mut idx = start;
        self.slots[idx].key = key;
        while let Some(parent) = self.slots[idx].parent {
            self.swap_payload(idx, parent);
            let displaced = self.slots[idx].item.clone();
            self.handles.insert(displaced, idx);
            idx = parent;
        }
        self.handles.insert(item.clone(), idx);

        let following = self.unlink(idx);
        if self.roots == Some(idx) {
            self.roots = following;
        }
        let children = self.cut_root(idx);
        self.roots = self.merge(self.roots, children);
        self.roots = self.merge(self.roots, Some(idx));
    }

    /// Returns the minimal item without removing it
    pub fn peek_min(&self) -> Option<(&K, &T)> {
        let idx = self.find_min()?;
        let slot = &self.slots[idx];
        Some((&slot.key, &slot.item))
    }

    /// Removes and returns the minimal item
    pub fn poll_min(&mut self) -> Option<(K, T)> {
        let min = self.find_min()?;

        let following = self.unlink(min);
        if self.roots == Some(min) {
            self.roots = following;
        }
        let children = self.cut_root(min);
        self.roots = self.merge(self.roots, children);

        let slot = &self.slots[min];
        let result = (slot.key.clone(), slot.item.clone());
        self.handles.remove(&result.1);
        self.free.push(min);
        Some(result)
    }

    fn find_min(&self) -> Option<usize> {
        let mut min = self.roots?;
        let mut curr = self.slots[min].next;
        while let Some(idx) = curr {
            if self.slots[idx].key < self.slots[min].key {
                min = idx;
            }
            curr = self.slots[idx].next;
        }
        Some(min)
    }

    fn swap_payload(&mut self, a: usize, b: usize) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi);
        let (x, y) = (&mut left[lo], &mut right[0]);
        std::mem::swap(&mut x.key, &mut y.key);
        std::mem::swap(&mut x.item, &mut y.item);
    }

    /// Removes a slot from its sibling list, returning the following sibling
    fn unlink(&mut self, idx: usize) -> Option<usize> {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if let Some(p) = prev {
            self.slots[p].next = next;
        }
        if let Some(n) = next {
            self.slots[n].prev = prev;
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
        next
    }

    fn insert_before(&mut self, at: usize, idx: usize) {
        let prev = self.slots[at].prev;
        if let Some(p) = prev {
            self.slots[p].next = Some(idx);
        }
        self.slots[idx].prev = prev;
        self.slots[idx].next = Some(at);
        self.slots[at].prev = Some(idx);
    }

    /// Detaches the children of a root and returns them as a root list
    ///
    /// Children are stored in decreasing order, so the list is reversed.
    fn cut_root(&mut self, idx: usize) -> Option<usize> {
        let mut curr = self.slots[idx].children?;
        loop {
            let slot = &mut self.slots[curr];
            slot.parent = None;
            let next = slot.next;
            slot.next = slot.prev;
            slot.prev = next;
            match next {
                Some(n) => curr = n,
                None => break,
            }
        }
        self.slots[idx].order = 0;
        self.slots[idx].children = None;
        Some(curr)
    }

    /// Links two trees of the same order; the smaller root wins
    fn link(&mut self, a: usize, b: usize) -> usize {
        let (parent, child) = if self.slots[a].key <= self.slots[b].key {
            (a, b)
        } else {
            (b, a)
        };

        self.slots[parent].order += 1;
        if let Some(head) = self.slots[parent].children {
            self.insert_before(head, child);
        }
        self.slots[parent].children = Some(child);
        self.slots[child].parent = Some(parent);
        parent
    }

    fn take_list(&mut self, head: Option<usize>) -> Vec<usize> {
        let mut list = Vec::new();
        let mut curr = head;
        while let Some(idx) = curr {
            curr = self.slots[idx].next;
            self.slots[idx].prev = None;
            self.slots[idx].next = None;
            list.push(idx);
        }
        list
    }

    /// Merges two root lists into one
    ///
    /// First the lists are merged by order, then trees of equal order are
    /// linked pairwise with a carry, like binary addition.
    fn merge(&mut self, first: Option<usize>, second: Option<usize>) -> Option<usize> {
        if first.is_none() {
            return second;
        }
        if second.is_none() {
            return first;
        }

        let first = self.take_list(first);
        let second = self.take_list(second);

        let mut sorted = Vec::with_capacity(first.len() + second.len());
        let (mut i, mut j) = (0, 0);
        while i < first.len() && j < second.len() {
            if self.slots[first[i]].order <= self.slots[second[j]].order {
                sorted.push(first[i]);
                i += 1;
            } else {
                sorted.push(second[j]);
                j += 1;
            }
        }
        sorted.extend_from_slice(&first[i..]);
        sorted.extend_from_slice(&second[j..]);

        let mut by_order: Vec<Option<usize>> = Vec::new();
        for mut tree in sorted {
            loop {
                let order = self.slots[tree].order;
                if by_order.len() <= order {
                    by_order.resize(order + 1, None);
                }
                match by_order[order].take() {
                    Some(carry) => tree = self.link(carry, tree),
                    None => {
                        by_order[order] = Some(tree);
                        break;
                    }
                }
            }
        }

        let mut head = None;
        let mut tail: Option<usize> = None;
        for tree in by_order.into_iter().flatten() {
            match tail {
                Some(t) => {
                    self.slots[t].next = Some(tree);
                    self.slots[tree].prev = Some(t);
                }
                None => head = Some(tree),
            }
            tail = Some(tree);
        }
        head
    }
}

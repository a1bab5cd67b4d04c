//! Indexed binary min-heap for the OPTICS seed set.
//!
//! Items are point indices `0..n`, keyed by their current reachability.
//! Each item is in the heap at most once; `slot` maps an item to its heap
//! position so a better key can be applied in place (decrease-key) instead of
//! pushing a duplicate. Ties are broken by the smaller point index.

#[derive(Debug, Clone)]
pub(crate) struct SeedQueue {
    heap: Vec<(f64, usize)>,
    slot: Vec<Option<usize>>,
}

impl SeedQueue {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            heap: Vec::new(),
            slot: vec![None; n],
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Current key of `item`, if it is queued.
    #[cfg(test)]
    pub(crate) fn key(&self, item: usize) -> Option<f64> {
        self.slot[item].map(|pos| self.heap[pos].0)
    }

    /// Queue `item` at `key`, or lower its key if already queued.
    ///
    /// Returns false, leaving the queue untouched, when `item` is queued with
    /// a key no larger than `key`.
    pub(crate) fn push_or_decrease(&mut self, item: usize, key: f64) -> bool {
        match self.slot[item] {
            Some(pos) => {
                if !key.total_cmp(&self.heap[pos].0).is_lt() {
                    return false;
                }
                self.heap[pos].0 = key;
                self.sift_up(pos);
            }
            None => {
                self.heap.push((key, item));
                let pos = self.heap.len() - 1;
                self.slot[item] = Some(pos);
                self.sift_up(pos);
            }
        }
        true
    }

    /// Remove and return the item with the smallest (key, index).
    pub(crate) fn pop_min(&mut self) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let (_, item) = self.heap.pop()?;
        self.slot[item] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(item)
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let (ka, ia) = self.heap[a];
        let (kb, ib) = self.heap[b];
        ka.total_cmp(&kb).then(ia.cmp(&ib)).is_lt()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slot[self.heap[a].1] = Some(a);
        self.slot[self.heap[b].1] = Some(b);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_key_then_index_order() {
        let mut q = SeedQueue::new(6);
        q.push_or_decrease(4, 2.0);
        q.push_or_decrease(1, 3.0);
        q.push_or_decrease(5, 1.0);
        q.push_or_decrease(2, 2.0);
        assert_eq!(q.len(), 4);

        let order: Vec<usize> = std::iter::from_fn(|| q.pop_min()).collect();
        assert_eq!(order, vec![5, 2, 4, 1]);
        assert!(q.is_empty());
    }

    #[test]
    fn decrease_key_moves_item_forward() {
        let mut q = SeedQueue::new(4);
        q.push_or_decrease(0, 5.0);
        q.push_or_decrease(1, 4.0);
        q.push_or_decrease(2, 3.0);
        assert!(q.push_or_decrease(0, 1.0));
        assert_eq!(q.key(0), Some(1.0));
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop_min(), Some(0));
        assert_eq!(q.pop_min(), Some(2));
    }

    #[test]
    fn larger_key_is_ignored() {
        let mut q = SeedQueue::new(2);
        q.push_or_decrease(1, 1.0);
        assert!(!q.push_or_decrease(1, 2.0));
        assert!(!q.push_or_decrease(1, 1.0));
        assert_eq!(q.key(1), Some(1.0));
        assert_eq!(q.key(0), None);
    }

    #[test]
    fn popped_items_can_be_requeued() {
        let mut q = SeedQueue::new(3);
        q.push_or_decrease(2, 0.5);
        assert_eq!(q.pop_min(), Some(2));
        assert_eq!(q.key(2), None);
        q.push_or_decrease(2, 7.0);
        assert_eq!(q.pop_min(), Some(2));
        assert_eq!(q.pop_min(), None);
    }
}

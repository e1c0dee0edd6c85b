//! Bucketed priority queue for cost-ordered expansion.
//!
//! Costs in Dijkstra-like expansion grow slowly and stay within a bounded
//! range of the current minimum, so a flat array of FIFO buckets beats a
//! heap: add and pop are O(1) amortized. Labels whose cost falls beyond the
//! bucket range go to an overflow list; when the in-range buckets drain, the
//! range is rebased onto the cheapest overflow cohort.

use std::collections::VecDeque;

/// Fixed-range bucket array plus overflow.
#[derive(Debug, Default)]
pub struct DoubleBucketQueue {
    bucket_size: f32,
    bucket_range: f32,
    /// Cost at the bottom of bucket 0; moves up on rebase.
    mincost: f32,
    /// Costs at or above this go to overflow.
    maxcost: f32,
    buckets: Vec<VecDeque<u32>>,
    /// Lowest bucket that may be non-empty.
    current: usize,
    overflow: Vec<u32>,
}

impl DoubleBucketQueue {
    pub fn new(mincost: f32, range: f32, bucket_size: f32) -> Self {
        let count = (range / bucket_size).ceil() as usize + 1;
        Self {
            bucket_size,
            bucket_range: range,
            mincost,
            maxcost: mincost + range,
            buckets: vec![VecDeque::new(); count],
            current: 0,
            overflow: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overflow.is_empty() && self.buckets.iter().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.overflow.clear();
        self.current = 0;
    }

    /// Queue a label at the given sort cost.
    pub fn add(&mut self, label: u32, cost: f32) {
        if cost < self.maxcost {
            let idx = self.bucket_index(cost);
            self.buckets[idx].push_back(label);
            if idx < self.current {
                self.current = idx;
            }
        } else {
            self.overflow.push(label);
        }
    }

    /// Move a label to a lower cost. `oldcost` must be the cost it was last
    /// added or decreased with.
    pub fn decrease(&mut self, label: u32, newcost: f32, oldcost: f32) {
        debug_assert!(newcost <= oldcost);
        if oldcost < self.maxcost {
            let idx = self.bucket_index(oldcost);
            if let Some(pos) = self.buckets[idx].iter().position(|&l| l == label) {
                self.buckets[idx].remove(pos);
            }
        } else if let Some(pos) = self.overflow.iter().position(|&l| l == label) {
            self.overflow.swap_remove(pos);
        }
        self.add(label, newcost);
    }

    /// Pop the label with the lowest cost; ties resolve in insertion order.
    /// `sortcost` is consulted when the overflow cohort is redistributed.
    pub fn pop(&mut self, mut sortcost: impl FnMut(u32) -> f32) -> Option<u32> {
        loop {
            while self.current < self.buckets.len() {
                if let Some(label) = self.buckets[self.current].pop_front() {
                    return Some(label);
                }
                self.current += 1;
            }
            if self.overflow.is_empty() {
                return None;
            }
            self.rebase(&mut sortcost);
        }
    }

    fn bucket_index(&self, cost: f32) -> usize {
        let idx = ((cost - self.mincost).max(0.0) / self.bucket_size) as usize;
        idx.min(self.buckets.len() - 1)
    }

    /// Rebase the bucket range onto the cheapest overflow label and pull in
    /// everything that now fits.
    fn rebase(&mut self, sortcost: &mut impl FnMut(u32) -> f32) {
        let mut min = f32::MAX;
        for &label in &self.overflow {
            min = min.min(sortcost(label));
        }
        self.mincost = min;
        self.maxcost = min + self.bucket_range;
        self.current = 0;

        let pending = std::mem::take(&mut self.overflow);
        for label in pending {
            let cost = sortcost(label);
            if cost < self.maxcost {
                let idx = self.bucket_index(cost);
                self.buckets[idx].push_back(label);
            } else {
                self.overflow.push(label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_cost_order() {
        let mut queue = DoubleBucketQueue::new(0.0, 100.0, 1.0);
        let costs = [5.0f32, 1.0, 3.0, 2.0, 4.0];
        for (label, &cost) in costs.iter().enumerate() {
            queue.add(label as u32, cost);
        }
        let mut popped = Vec::new();
        while let Some(label) = queue.pop(|l| costs[l as usize]) {
            popped.push(label);
        }
        assert_eq!(popped, vec![1, 3, 2, 4, 0]);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut queue = DoubleBucketQueue::new(0.0, 10.0, 1.0);
        queue.add(8, 2.5);
        queue.add(3, 2.5);
        queue.add(5, 2.5);
        assert_eq!(queue.pop(|_| 2.5), Some(8));
        assert_eq!(queue.pop(|_| 2.5), Some(3));
        assert_eq!(queue.pop(|_| 2.5), Some(5));
        assert_eq!(queue.pop(|_| 2.5), None);
    }

    #[test]
    fn overflow_is_rebased() {
        let costs = [250.0f32, 150.0, 5.0];
        let mut queue = DoubleBucketQueue::new(0.0, 100.0, 1.0);
        for (label, &cost) in costs.iter().enumerate() {
            queue.add(label as u32, cost);
        }
        let lookup = |l: u32| costs[l as usize];
        assert_eq!(queue.pop(lookup), Some(2));
        assert_eq!(queue.pop(lookup), Some(1));
        assert_eq!(queue.pop(lookup), Some(0));
        assert_eq!(queue.pop(lookup), None);
    }

    #[test]
    fn decrease_moves_the_label_forward() {
        let mut queue = DoubleBucketQueue::new(0.0, 100.0, 1.0);
        queue.add(0, 50.0);
        queue.add(1, 10.0);
        queue.decrease(0, 2.0, 50.0);
        assert_eq!(queue.pop(|_| 0.0), Some(0));
        assert_eq!(queue.pop(|_| 0.0), Some(1));
    }
}

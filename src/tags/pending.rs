use std::{cmp::Reverse, collections::BinaryHeap};

#[derive(Debug)]
struct Pending<T> {
    payload: T,
    ready_cycle: usize,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ready_cycle == other.ready_cycle
    }
}
impl<T> Eq for Pending<T> {}
impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ready_cycle.cmp(&other.ready_cycle)
    }
}

/// In-flight work ordered by the cycle it becomes ready, soonest first.
#[derive(Debug)]
pub struct PendingQueue<T> {
    heap: BinaryHeap<Reverse<Pending<T>>>,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        PendingQueue {
            heap: BinaryHeap::new(),
        }
    }
    pub fn push(&mut self, payload: T, ready_cycle: usize) {
        self.heap.push(Reverse(Pending {
            payload,
            ready_cycle,
        }));
    }
    pub fn pop(&mut self) -> Option<(usize, T)> {
        self.heap.pop().map(
            |Reverse(Pending {
                 payload,
                 ready_cycle,
             })| (ready_cycle, payload),
        )
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pops_soonest_first() {
        let mut pending = PendingQueue::new();
        pending.push("late", 30);
        pending.push("early", 10);
        pending.push("mid", 20);
        assert_eq!(pending.pop(), Some((10, "early")));
        assert_eq!(pending.pop(), Some((20, "mid")));
        pending.push("again", 5);
        assert_eq!(pending.pop(), Some((5, "again")));
        assert_eq!(pending.pop(), Some((30, "late")));
        assert!(pending.is_empty());
    }
}

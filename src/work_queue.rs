use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::path::RouteRequest;

/// A thread-safe FIFO of routing requests.
///
/// One `parking_lot::Mutex` around a plain `VecDeque`, no lock-free
/// structure. All loading happens before workers start; `pop` is the
/// only operation exercised during routing.
pub struct WorkQueue {
    items: Mutex<VecDeque<RouteRequest>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_requests<I: IntoIterator<Item = RouteRequest>>(requests: I) -> Self {
        Self {
            items: Mutex::new(requests.into_iter().collect()),
        }
    }

    pub fn push(&self, item: RouteRequest) {
        self.items.lock().push_back(item);
    }

    /// Pops the next request, or `None` if the queue is drained.
    pub fn pop(&self) -> Option<RouteRequest> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let q = WorkQueue::new();
        q.push(RouteRequest::new((0, 0, 0), (1, 0, 0)));
        q.push(RouteRequest::new((0, 0, 0), (2, 0, 0)));
        assert_eq!(q.pop().unwrap().destination, (1, 0, 0));
        assert_eq!(q.pop().unwrap().destination, (2, 0, 0));
        assert!(q.pop().is_none());
    }

    #[test]
    fn empty_is_empty() {
        let q = WorkQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
    }
}

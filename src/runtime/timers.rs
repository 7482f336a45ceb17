// Timer queue - Cancelable one-shot tasks for a single-threaded event loop
//
// Tasks are keyed by a due time on the wall clock. The owner drives the queue
// by popping whatever is due; nothing here sleeps or spawns threads.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Reference to a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

pub struct TimerQueue<T> {
    // Min-heap on (due, sequence); sequence breaks ties in scheduling order
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    tasks: HashMap<u64, T>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule_at(&mut self, due: Duration, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((due, id)));
        self.tasks.insert(id, task);
        TimerHandle(id)
    }

    /// Cancel a pending task. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        // The heap entry becomes stale and is skipped when reached
        self.tasks.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    /// Remove the earliest task due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, T)> {
        self.discard_stale();
        let Reverse((due, id)) = *self.heap.peek()?;
        if due > now {
            return None;
        }
        self.heap.pop();
        self.tasks.remove(&id).map(|task| (TimerHandle(id), task))
    }

    /// Due time of the earliest live task
    pub fn next_due(&mut self) -> Option<Duration> {
        self.discard_stale();
        self.heap.peek().map(|Reverse((due, _))| *due)
    }

    /// Keep only tasks matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.tasks.retain(|_, task| keep(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.tasks.clear();
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.tasks.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_pops_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(30), "c");
        queue.schedule_at(ms(10), "a");
        queue.schedule_at(ms(20), "b");

        assert_eq!(queue.next_due(), Some(ms(10)));
        assert!(queue.pop_due(ms(5)).is_none());

        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(100)).map(|(_, t)| t)).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut queue = TimerQueue::new();
        for i in 0..5 {
            queue.schedule_at(ms(10), i);
        }
        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(10)).map(|(_, t)| t)).collect();
        assert_eq!(fired, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule_at(ms(10), 1);
        let second = queue.schedule_at(ms(20), 2);

        assert_eq!(queue.cancel(first), Some(1));
        assert_eq!(queue.cancel(first), None);
        assert!(!queue.is_pending(first));
        assert!(queue.is_pending(second));

        // Cancelled entry no longer drives the next deadline
        assert_eq!(queue.next_due(), Some(ms(20)));
        assert_eq!(queue.pop_due(ms(50)).map(|(h, t)| (h, t)), Some((second, 2)));
    }

    #[test]
    fn test_retain() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(1), "keep");
        queue.schedule_at(ms(2), "drop");
        queue.schedule_at(ms(3), "keep");

        queue.retain(|t| *t == "keep");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_due(ms(10)).map(|(_, t)| t), Some("keep"));
        assert_eq!(queue.pop_due(ms(10)).map(|(_, t)| t), Some("keep"));
        assert!(queue.pop_due(ms(10)).is_none());
    }
}

use crate::domain::LogEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ordered, append-only buffer of formatted events.
///
/// Appends and drains each take the lock once, so a drain never observes half of an append:
/// events appended after the drain's snapshot belong to the next drain.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<Vec<LogEvent>>,
    appended: AtomicU64,
    drained: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, events: Vec<LogEvent>) {
        if events.is_empty() {
            return;
        }
        let count = events.len() as u64;
        self.events.lock().extend(events);
        self.appended.fetch_add(count, Ordering::Relaxed);
    }

    /// Removes and returns everything queued, leaving the queue empty.
    pub fn drain(&self) -> Vec<LogEvent> {
        let events = std::mem::take(&mut *self.events.lock());
        self.drained.fetch_add(events.len() as u64, Ordering::Relaxed);
        events
    }

    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    pub fn total_drained(&self) -> u64 {
        self.drained.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_empties_queue() {
        let queue = EventQueue::new();
        queue.append(vec![LogEvent::new(1, "a"), LogEvent::new(2, "b")]);

        assert_eq!(queue.drain(), vec![LogEvent::new(1, "a"), LogEvent::new(2, "b")]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
        assert_eq!(queue.total_appended(), 2);
        assert_eq!(queue.total_drained(), 2);
    }

    #[test]
    fn test_concurrent_appends_are_never_lost() {
        let queue = Arc::new(EventQueue::new());
        let mut handles = vec![];
        let mut drained = Vec::new();

        for i in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    queue.append(vec![LogEvent::new(i * 100 + j, format!("{i}-{j}"))]);
                }
            }));
        }

        for _ in 0..50 {
            drained.extend(queue.drain());
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drained.extend(queue.drain());

        assert_eq!(drained.len(), 800);
        assert_eq!(queue.total_appended(), queue.total_drained());
    }
}

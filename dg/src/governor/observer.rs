//! Queue observer hook

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

/// Callback receiving `(active, waiting)` after every queue transition
pub type QueueObserver = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Holds at most one observer; the latest registration replaces the previous one
#[derive(Default)]
pub struct ObserverSlot {
    observer: Mutex<Option<QueueObserver>>,
}

impl ObserverSlot {
    pub fn new(observer: Option<QueueObserver>) -> Self {
        Self {
            observer: Mutex::new(observer),
        }
    }

    pub fn set(&self, observer: QueueObserver) {
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    pub fn clear(&self) {
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Invoke the registered observer inline
    pub fn notify(&self, active: usize, waiting: usize) {
        let observer = self.observer.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(observer) = observer {
            observer(active, waiting);
        }
    }
}

/// Observer that reports transitions as `info` events
pub fn logging_observer() -> QueueObserver {
    Arc::new(|active, waiting| info!(active, waiting, "Request queue changed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let slot = ObserverSlot::default();

        let f = first.clone();
        slot.set(Arc::new(move |_, _| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        slot.notify(1, 0);

        let s = second.clone();
        slot.set(Arc::new(move |_, _| {
            s.fetch_add(1, Ordering::SeqCst);
        }));
        slot.notify(1, 1);
        slot.notify(0, 1);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_and_cleared_slot_is_silent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = ObserverSlot::new(None);
        slot.notify(0, 0);

        let c = calls.clone();
        slot.set(Arc::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        slot.clear();
        slot.notify(2, 3);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_observer_receives_counts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let slot = ObserverSlot::new(Some(Arc::new(move |active, waiting| {
            s.lock().unwrap().push((active, waiting));
        })));

        slot.notify(2, 5);
        assert_eq!(*seen.lock().unwrap(), vec![(2, 5)]);
    }
}

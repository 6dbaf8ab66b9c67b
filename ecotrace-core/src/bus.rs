//! Change notification bus - fan-out to observers when aggregates change.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Fan-out notification bus.
///
/// Subscribers are invoked with no payload: "something changed", not "here
/// is what changed" - they re-read state themselves. Each callback runs in
/// isolation, so one panicking subscriber neither stops the loop nor
/// reaches the mutating caller. No ordering is guaranteed among
/// subscribers.
#[derive(Clone, Default)]
pub struct ChangeBus {
    subscribers: Arc<Mutex<BTreeMap<u64, Callback>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked after every successful mutation.
    ///
    /// The returned [`Subscription`] unsubscribes when dropped; hold onto
    /// it for as long as the callback should stay registered.
    #[must_use = "dropping the subscription unsubscribes the callback"]
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, Arc::new(callback));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Notify every current subscriber.
    pub fn notify(&self) {
        // Snapshot under the lock, invoke outside it, so a callback may
        // subscribe or unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = self.subscribers.lock().values().cloned().collect();
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!("change subscriber panicked, continuing with remaining subscribers");
            }
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Handle to a registered callback. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    subscribers: std::sync::Weak<Mutex<BTreeMap<u64, Callback>>>,
}

impl Subscription {
    /// Unsubscribe explicitly.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn subscribers_are_notified() {
        let bus = ChangeBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let _sub = bus.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.notify();
        bus.notify();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = ChangeBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let sub = bus.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count(), 1);

        bus.notify();
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        bus.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_unsubscribe() {
        let bus = ChangeBus::new();
        let sub = bus.subscribe(|| {});
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_the_others() {
        let bus = ChangeBus::new();
        let reached = Arc::new(AtomicUsize::new(0));

        let _panicking = bus.subscribe(|| panic!("observer bug"));
        let r = reached.clone();
        let _working = bus.subscribe(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        // Must not propagate to the caller either.
        bus.notify();
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriber_may_subscribe_during_notify() {
        let bus = ChangeBus::new();
        let inner_bus = bus.clone();
        let late = Arc::new(Mutex::new(Vec::new()));

        let l = late.clone();
        let _sub = bus.subscribe(move || {
            // Registering from inside a notification must not deadlock.
            let s = inner_bus.subscribe(|| {});
            l.lock().push(s);
        });

        bus.notify();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn multiple_subscribers_all_invoked() {
        let bus = ChangeBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subs: Vec<_> = (0..5)
            .map(|_| {
                let c = count.clone();
                bus.subscribe(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        bus.notify();
        assert_eq!(count.load(Ordering::SeqCst), 5);
        drop(subs);
    }
}

//! Subscriber registry.
//!
//! Maps event names to ordered listener lists. Registration order is
//! invocation order, duplicates are allowed, and removal is by listener
//! identity. The registry outlives any single transport: reconnects and
//! explicit disconnects never touch it.
//!
//! # Emission
//!
//! [`Registry::emit`] snapshots the listener list and releases the lock
//! before calling anything, so a listener may register or remove
//! listeners (including itself) while being invoked. Changes take effect
//! from the next emission. A panicking listener is caught and logged; the
//! remaining listeners still run.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{error, trace};

// ============================================================================
// Types
// ============================================================================

/// Listener callback.
///
/// Receives the event payload. Identity (for [`Registry::remove`]) is the
/// `Arc` allocation, so keep a clone of the listener you register if you
/// intend to remove it later.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Wraps a closure as a [`Listener`].
#[inline]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// Registry
// ============================================================================

/// Event name → ordered listeners.
#[derive(Default)]
pub struct Registry {
    listeners: Mutex<FxHashMap<String, Vec<Listener>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `event`.
    pub fn add(&self, event: &str, listener: Listener) {
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Removes the first registration of `listener` for `event`.
    ///
    /// Returns `true` if a registration was removed.
    pub fn remove(&self, event: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();

        let Some(list) = listeners.get_mut(event) else {
            return false;
        };

        let Some(index) = list.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            listeners.remove(event);
        }

        true
    }

    /// Returns the number of registrations for `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Invokes every listener for `event` in registration order.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn emit(&self, event: &str, data: &Value) -> usize {
        let snapshot = match self.listeners.lock().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for (index, listener) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(data))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    error!(
                        event,
                        index,
                        panic = panic_message(panic.as_ref()),
                        "Listener panicked"
                    );
                }
            }
        }

        trace!(event, completed, total = snapshot.len(), "Event emitted");
        completed
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock();
        let mut map = f.debug_map();
        for (event, list) in listeners.iter() {
            map.entry(event, &list.len());
        }
        map.finish()
    }
}

/// Extracts the message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    /// Listener that appends `tag` to `log` on every call.
    fn tagged(log: &Arc<Mutex<Vec<usize>>>, tag: usize) -> Listener {
        let log = Arc::clone(log);
        listener(move |_| log.lock().push(tag))
    }

    #[test]
    fn test_emit_passes_data() {
        let registry = Registry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.add(
            "charger_status",
            listener(move |data| sink.lock().push(data.clone())),
        );

        let invoked = registry.emit("charger_status", &json!({ "id": 3 }));

        assert_eq!(invoked, 1);
        assert_eq!(*seen.lock(), vec![json!({ "id": 3 })]);
    }

    #[test]
    fn test_emit_unknown_event_is_noop() {
        let registry = Registry::new();
        assert_eq!(registry.emit("nothing", &Value::Null), 0);
    }

    #[test]
    fn test_emit_only_targets_named_event() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add("metrics", tagged(&log, 1));
        registry.add("traffic", tagged(&log, 2));

        registry.emit("traffic", &Value::Null);

        assert_eq!(*log.lock(), vec![2]);
    }

    #[test]
    fn test_two_subscribers_then_off_first() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = tagged(&log, 1);
        let second = tagged(&log, 2);
        registry.add("charger_status", Arc::clone(&first));
        registry.add("charger_status", Arc::clone(&second));

        registry.emit("charger_status", &Value::Null);
        assert_eq!(*log.lock(), vec![1, 2]);

        assert!(registry.remove("charger_status", &first));
        registry.emit("charger_status", &Value::Null);
        assert_eq!(*log.lock(), vec![1, 2, 2]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registered = tagged(&log, 1);
        let stranger = tagged(&log, 2);

        assert!(!registry.remove("never", &registered));

        registry.add("metrics", Arc::clone(&registered));
        assert!(!registry.remove("metrics", &stranger));
        assert_eq!(registry.count("metrics"), 1);
    }

    #[test]
    fn test_duplicate_registration_removed_one_at_a_time() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let repeated = tagged(&log, 7);
        registry.add("metrics", Arc::clone(&repeated));
        registry.add("metrics", Arc::clone(&repeated));

        registry.emit("metrics", &Value::Null);
        assert_eq!(*log.lock(), vec![7, 7]);

        assert!(registry.remove("metrics", &repeated));
        registry.emit("metrics", &Value::Null);
        assert_eq!(*log.lock(), vec![7, 7, 7]);

        assert!(registry.remove("metrics", &repeated));
        assert_eq!(registry.count("metrics"), 0);
        assert_eq!(format!("{registry:?}"), "{}");
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.add("error", tagged(&log, 1));
        registry.add("error", listener(|_| panic!("listener blew up")));
        registry.add("error", tagged(&log, 3));

        let completed = registry.emit("error", &Value::Null);

        assert_eq!(completed, 2);
        assert_eq!(*log.lock(), vec![1, 3]);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let registry = Arc::new(Registry::new());
        let calls = Arc::new(Mutex::new(0));

        let slot: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));
        let once = {
            let registry = Arc::clone(&registry);
            let calls = Arc::clone(&calls);
            let slot = Arc::clone(&slot);
            listener(move |_| {
                *calls.lock() += 1;
                if let Some(me) = slot.lock().take() {
                    registry.remove("connected", &me);
                }
            })
        };
        *slot.lock() = Some(Arc::clone(&once));
        registry.add("connected", once);

        registry.emit("connected", &Value::Null);
        registry.emit("connected", &Value::Null);

        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_panic_message() {
        let static_str: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(static_str.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    proptest! {
        #[test]
        fn prop_emit_follows_registration_order(tags in proptest::collection::vec(0usize..1000, 0..32)) {
            let registry = Registry::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            for &tag in &tags {
                registry.add("metrics", tagged(&log, tag));
            }

            let invoked = registry.emit("metrics", &Value::Null);

            prop_assert_eq!(invoked, tags.len());
            prop_assert_eq!(log.lock().clone(), tags);
        }

        #[test]
        fn prop_remove_drops_exactly_one(count in 1usize..16, pick in 0usize..16) {
            let pick = pick % count;
            let registry = Registry::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            let listeners: Vec<Listener> = (0..count).map(|tag| tagged(&log, tag)).collect();
            for l in &listeners {
                registry.add("traffic", Arc::clone(l));
            }

            prop_assert!(registry.remove("traffic", &listeners[pick]));
            registry.emit("traffic", &Value::Null);

            let expected: Vec<usize> = (0..count).filter(|&tag| tag != pick).collect();
            prop_assert_eq!(log.lock().clone(), expected);
            prop_assert_eq!(registry.count("traffic"), count - 1);
        }
    }
}

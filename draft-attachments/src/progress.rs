//! Progress subscriptions for in-flight uploads.
//!
//! Each attachment is identified by its client id; at most one progress
//! handler is live per client id at a time. Registering for an id that
//! already has a handler replaces the old registration (release-then-acquire)
//! so retries never end up with duplicate callbacks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback invoked with progress values in [0, 1]
pub type ProgressHandler = Arc<dyn Fn(f32) + Send + Sync>;

struct Entry {
    token: u64,
    handler: ProgressHandler,
}

#[derive(Default)]
struct RegistryInner {
    next_token: u64,
    entries: HashMap<String, Entry>,
}

/// Handler table keyed by attachment client id
#[derive(Clone, Default)]
pub struct ProgressRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a handler for a client id, replacing any previous one.
    ///
    /// The returned guard releases the registration when dropped. Each
    /// registration carries a token so a stale guard that outlives its
    /// replacement never removes the newer registration.
    pub fn register(&self, client_id: &str, handler: ProgressHandler) -> ProgressSubscription {
        let token = {
            let mut inner = self.lock();
            inner.next_token += 1;
            let token = inner.next_token;
            inner
                .entries
                .insert(client_id.to_string(), Entry { token, handler });
            token
        };

        ProgressSubscription {
            registry: self.clone(),
            client_id: client_id.to_string(),
            token,
            released: false,
        }
    }

    /// Deliver a progress value to the current handler for a client id
    pub fn emit(&self, client_id: &str, value: f32) {
        // Clone the handler out so it runs without holding the lock
        let handler = self.lock().entries.get(client_id).map(|e| e.handler.clone());
        if let Some(handler) = handler {
            handler(value.clamp(0.0, 1.0));
        }
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.lock().entries.contains_key(client_id)
    }

    fn release(&self, client_id: &str, token: u64) {
        let mut inner = self.lock();
        if inner.entries.get(client_id).map(|e| e.token) == Some(token) {
            inner.entries.remove(client_id);
        }
    }
}

/// Guard for one progress registration.
///
/// Tied to the lifetime of whoever observes the upload: dropping the guard
/// releases the registration exactly once, on every exit path.
#[must_use = "dropping the subscription unregisters the progress handler"]
pub struct ProgressSubscription {
    registry: ProgressRegistry,
    client_id: String,
    token: u64,
    released: bool,
}

impl ProgressSubscription {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Release the registration. Safe to call more than once.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(&self.client_id, self.token);
        }
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_handler() -> (ProgressHandler, Arc<Mutex<Vec<f32>>>) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let handler: ProgressHandler = Arc::new(move |v| sink.lock().unwrap().push(v));
        (handler, values)
    }

    #[test]
    fn test_register_emit_release() {
        let registry = ProgressRegistry::new();
        let (handler, values) = recording_handler();

        let mut sub = registry.register("c1", handler);
        assert!(registry.is_registered("c1"));

        registry.emit("c1", 0.25);
        registry.emit("c1", 0.5);
        assert_eq!(*values.lock().unwrap(), vec![0.25, 0.5]);

        sub.release();
        assert!(!registry.is_registered("c1"));

        // No delivery after release
        registry.emit("c1", 0.75);
        assert_eq!(*values.lock().unwrap(), vec![0.25, 0.5]);
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = ProgressRegistry::new();
        let (handler, _) = recording_handler();

        let mut sub = registry.register("c1", handler);
        sub.release();
        sub.release();
        assert!(!registry.is_registered("c1"));
    }

    #[test]
    fn test_drop_releases_exactly_once() {
        let registry = ProgressRegistry::new();
        let (handler, _) = recording_handler();

        {
            let _sub = registry.register("c1", handler);
            assert!(registry.is_registered("c1"));
        }
        assert!(!registry.is_registered("c1"));
    }

    #[test]
    fn test_reregister_replaces_instead_of_duplicating() {
        let registry = ProgressRegistry::new();
        let (first_handler, first_values) = recording_handler();
        let (second_handler, second_values) = recording_handler();

        let stale = registry.register("c1", first_handler);
        let _current = registry.register("c1", second_handler);

        // Only the newer handler receives values
        registry.emit("c1", 0.4);
        assert!(first_values.lock().unwrap().is_empty());
        assert_eq!(*second_values.lock().unwrap(), vec![0.4]);

        // Dropping the stale guard must not tear down the live registration
        drop(stale);
        assert!(registry.is_registered("c1"));
        registry.emit("c1", 0.8);
        assert_eq!(*second_values.lock().unwrap(), vec![0.4, 0.8]);
    }

    #[test]
    fn test_emit_clamps_out_of_range_values() {
        let registry = ProgressRegistry::new();
        let (handler, values) = recording_handler();
        let _sub = registry.register("c1", handler);

        registry.emit("c1", -0.5);
        registry.emit("c1", 1.5);
        assert_eq!(*values.lock().unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_emit_for_unknown_id_is_ignored() {
        let registry = ProgressRegistry::new();
        registry.emit("missing", 0.3);
    }
}

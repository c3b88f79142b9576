//! In-memory realtime store.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use zonglist_core::{
    Clock, PushIdGenerator, SessionStore, StoreError, StorePath, Subscription, SystemClock,
};

/// In-memory store implementation.
///
/// Behaves like a realtime database shared by every client in the
/// process: a JSON tree where absent and empty nodes are pruned, and
/// listeners receive the full subtree whenever it changes. Useful for
/// development, single-process deployments and tests. Data is lost on
/// restart.
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    ids: PushIdGenerator,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

struct Listener {
    path: StorePath,
    tx: mpsc::UnboundedSender<Value>,
    last: Value,
}

#[derive(Default)]
struct Inner {
    root: Value,
    listeners: HashMap<u64, Listener>,
    next_listener: u64,
}

impl MemoryStore {
    /// Create an empty store using the system clock for push keys.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with an injected clock for push keys.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            ids: PushIdGenerator::new(),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate loss of connectivity: all mutations fail while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        tracing::info!(offline, "Memory store connectivity changed");
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.listeners.len()).unwrap_or(0)
    }

    fn lock_for_write(&self, path: &StorePath) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::write(path, "store is offline"));
        }
        self.inner
            .lock()
            .map_err(|e| StoreError::write(path, e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn apply(&mut self, path: &StorePath, value: Value) {
        set_at(&mut self.root, path.segments(), normalize(value));
    }

    fn notify(&mut self, changed: &[StorePath]) {
        let root = &self.root;
        self.listeners.retain(|id, listener| {
            if !changed.iter().any(|path| path.overlaps(&listener.path)) {
                return true;
            }
            let current = get_at(root, listener.path.segments());
            if current == listener.last {
                return true;
            }
            listener.last = current.clone();
            tracing::debug!(listener = id, path = %listener.path, "Notifying listener");
            listener.tx.send(current).is_ok()
        });
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Value, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::read(path, e.to_string()))?;
        Ok(get_at(&inner.root, path.segments()))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock_for_write(path)?;
        tracing::debug!(%path, "Store write");
        inner.apply(path, value);
        inner.notify(std::slice::from_ref(path));
        Ok(())
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        let targets = fields
            .into_iter()
            .map(|(relative, value)| Ok((path.join(&relative)?, value)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut inner = self.lock_for_write(path)?;
        tracing::debug!(%path, children = targets.len(), "Store update");
        let mut changed = Vec::with_capacity(targets.len());
        for (target, value) in targets {
            inner.apply(&target, value);
            changed.push(target);
        }
        inner.notify(&changed);
        Ok(())
    }

    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut inner = self.lock_for_write(path)?;
        tracing::debug!(%path, "Store delete");
        inner.apply(path, Value::Null);
        inner.notify(std::slice::from_ref(path));
        Ok(())
    }

    fn push_key(&self) -> String {
        self.ids.next_id(self.clock.now_millis())
    }

    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|e| StoreError::read(path, e.to_string()))?;
            let current = get_at(&inner.root, path.segments());
            tx.send(current.clone())
                .map_err(|e| StoreError::read(path, e.to_string()))?;

            let id = inner.next_listener;
            inner.next_listener += 1;
            inner.listeners.insert(
                id,
                Listener {
                    path: path.clone(),
                    tx,
                    last: current,
                },
            );
            id
        };
        tracing::debug!(listener = id, %path, "Listener registered");

        let inner: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(rx, move || {
            if let Some(inner) = inner.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.listeners.remove(&id);
                    tracing::debug!(listener = id, "Listener disposed");
                }
            }
        }))
    }
}

/// Drop nulls and empty objects, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

fn get_at(node: &Value, segments: &[String]) -> Value {
    segments
        .iter()
        .try_fold(node, |node, segment| node.get(segment))
        .cloned()
        .unwrap_or(Value::Null)
}

fn set_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.clone()).or_insert(Value::Null);
    set_at(child, rest, value);
    if child.is_null() {
        map.remove(head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

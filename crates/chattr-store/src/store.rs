use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

use chattr_types::{Fields, Record};

use crate::error::StoreError;
use crate::subscription::Subscription;

const SENTINEL_KEY: &str = "$server_timestamp";

/// Sentinel field value replaced with the server-assigned timestamp at
/// write time. The store clock is authoritative; clients that need "now"
/// in a document write this instead of reading their own clock.
pub fn server_timestamp() -> Value {
    let mut sentinel = serde_json::Map::new();
    sentinel.insert(SENTINEL_KEY.to_owned(), Value::Bool(true));
    Value::Object(sentinel)
}

/// Acknowledgment of an append: the generated document id and the
/// server-assigned timestamp.
#[derive(Debug, Clone)]
pub struct AppendAck {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Shared in-memory document store. Cheap to clone; all clones observe the
/// same collections and the same monotonic clock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Collection>,
    last_timestamp: Option<DateTime<Utc>>,
    faults: Vec<String>,
}

#[derive(Default)]
struct Collection {
    records: Vec<Record>,
    watchers: HashMap<Uuid, Watcher>,
}

struct Watcher {
    kind: WatchKind,
    tx: mpsc::UnboundedSender<Vec<Record>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchKind {
    /// Full list ascending by assigned timestamp (message streams).
    Ordered,
    /// Full current document set, ordered by id (directories).
    ByDocId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to a collection. The store assigns the document id
    /// and a timestamp strictly greater than every previously assigned one.
    pub fn append(&self, path: &str, fields: Fields) -> Result<AppendAck, StoreError> {
        let mut state = self.lock()?;
        state.take_fault(path)?;

        let timestamp = state.next_timestamp();
        let mut fields = fields;
        resolve_sentinels(&mut fields, timestamp);

        let id = Uuid::new_v4().to_string();
        let collection = state.collections.entry(path.to_owned()).or_default();
        collection.records.push(Record {
            id: id.clone(),
            created_at: timestamp,
            fields,
        });
        debug!(path, %id, "record appended");
        collection.notify();

        Ok(AppendAck { id, timestamp })
    }

    /// Create or merge a document with a caller-chosen id. Listed fields
    /// overwrite; existing fields not named in `fields` are preserved.
    pub fn upsert_merge(&self, path: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_fault(path)?;

        let timestamp = state.next_timestamp();
        let mut fields = fields;
        resolve_sentinels(&mut fields, timestamp);

        let collection = state.collections.entry(path.to_owned()).or_default();
        match collection.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                for (key, value) in fields {
                    record.fields.insert(key, value);
                }
                debug!(path, id, "record merged");
            }
            None => {
                collection.records.push(Record {
                    id: id.to_owned(),
                    created_at: timestamp,
                    fields,
                });
                debug!(path, id, "record created");
            }
        }
        collection.notify();

        Ok(())
    }

    /// Open a live subscription ordered ascending by assigned timestamp.
    /// The current snapshot is delivered immediately, then the full list
    /// again after every mutation of `path`.
    pub fn subscribe_ordered(&self, path: &str) -> Subscription {
        self.subscribe(path, WatchKind::Ordered)
    }

    /// Open a live subscription over the full document set of `path`,
    /// delivered in document-id order.
    pub fn subscribe_collection(&self, path: &str) -> Subscription {
        self.subscribe(path, WatchKind::ByDocId)
    }

    fn subscribe(&self, path: &str, kind: WatchKind) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher_id = Uuid::new_v4();

        match self.lock() {
            Ok(mut state) => {
                let collection = state.collections.entry(path.to_owned()).or_default();
                let _ = tx.send(snapshot(&collection.records, kind));
                collection.watchers.insert(watcher_id, Watcher { kind, tx });
                debug!(path, %watcher_id, "watcher attached");
            }
            Err(err) => {
                // Sender dropped here: the handle yields its end-of-stream
                // signal on the first poll instead of stalling forever.
                error!(path, %err, "subscribe failed");
            }
        }

        Subscription::new(self.clone(), path.to_owned(), watcher_id, rx)
    }

    /// Point read of a single document.
    pub fn get(&self, path: &str, id: &str) -> Option<Record> {
        let state = self.lock().ok()?;
        state
            .collections
            .get(path)?
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Number of live watchers on a path.
    pub fn watcher_count(&self, path: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|state| state.collections.get(path).map(|c| c.watchers.len()))
            .unwrap_or(0)
    }

    /// Arm a one-shot failure for the next write to `path`. Test hook for
    /// exercising error paths without a real backend.
    pub fn fail_next_write_to(&self, path: &str) {
        if let Ok(mut state) = self.lock() {
            state.faults.push(path.to_owned());
        }
    }

    pub(crate) fn detach(&self, path: &str, watcher_id: Uuid) {
        if let Ok(mut state) = self.lock()
            && let Some(collection) = state.collections.get_mut(path)
            && collection.watchers.remove(&watcher_id).is_some()
        {
            debug!(path, %watcher_id, "watcher detached");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl State {
    /// Server clock: wall time, bumped by a microsecond whenever wall time
    /// has not advanced past the previous assignment. Strictly monotonic
    /// across the whole store, so per-collection order is total.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let assigned = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(assigned);
        assigned
    }

    fn take_fault(&mut self, path: &str) -> Result<(), StoreError> {
        if let Some(pos) = self.faults.iter().position(|p| p == path) {
            self.faults.remove(pos);
            return Err(StoreError::WriteRejected(path.to_owned()));
        }
        Ok(())
    }
}

impl Collection {
    /// Push the current snapshot to every watcher, pruning any whose
    /// receiver has gone away.
    fn notify(&mut self) {
        let ordered = snapshot(&self.records, WatchKind::Ordered);
        let by_id = snapshot(&self.records, WatchKind::ByDocId);
        self.watchers.retain(|watcher_id, watcher| {
            let snap = match watcher.kind {
                WatchKind::Ordered => ordered.clone(),
                WatchKind::ByDocId => by_id.clone(),
            };
            let alive = watcher.tx.send(snap).is_ok();
            if !alive {
                debug!(%watcher_id, "watcher receiver gone, pruned");
            }
            alive
        });
    }
}

fn snapshot(records: &[Record], kind: WatchKind) -> Vec<Record> {
    let mut records = records.to_vec();
    match kind {
        WatchKind::Ordered => records.sort_by_key(|r| r.created_at),
        WatchKind::ByDocId => records.sort_by(|a, b| a.id.cmp(&b.id)),
    }
    records
}

fn resolve_sentinels(fields: &mut Fields, timestamp: DateTime<Utc>) {
    for value in fields.values_mut() {
        let is_sentinel = value
            .as_object()
            .is_some_and(|obj| obj.len() == 1 && obj.get(SENTINEL_KEY).is_some());
        if is_sentinel {
            *value = serde_json::to_value(timestamp).unwrap_or(Value::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn timestamps_strictly_increase() {
        let store = MemoryStore::new();
        let mut last: Option<DateTime<Utc>> = None;
        for i in 0..200 {
            let ack = store
                .append("items", fields(&[("n", json!(i))]))
                .unwrap();
            if let Some(prev) = last {
                assert!(ack.timestamp > prev, "clock went backwards at {i}");
            }
            last = Some(ack.timestamp);
        }
    }

    #[test]
    fn merge_preserves_unlisted_fields() {
        let store = MemoryStore::new();
        store
            .upsert_merge(
                "users",
                "u1",
                fields(&[("name", json!("Alice")), ("email", json!("a@x.io"))]),
            )
            .unwrap();
        store
            .upsert_merge("users", "u1", fields(&[("name", json!("Alicia"))]))
            .unwrap();

        let record = store.get("users", "u1").unwrap();
        assert_eq!(record.fields["name"], json!("Alicia"));
        assert_eq!(record.fields["email"], json!("a@x.io"));
    }

    #[test]
    fn sentinel_resolves_to_server_time() {
        let store = MemoryStore::new();
        store
            .upsert_merge("users", "u1", fields(&[("last_seen", server_timestamp())]))
            .unwrap();

        let record = store.get("users", "u1").unwrap();
        let seen: DateTime<Utc> =
            serde_json::from_value(record.fields["last_seen"].clone()).unwrap();
        assert_eq!(seen, record.created_at);
    }

    #[tokio::test]
    async fn ordered_subscription_pushes_full_snapshots() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_ordered("room/messages");

        // Initial snapshot arrives before any write.
        assert_eq!(sub.next().await.unwrap().len(), 0);

        store
            .append("room/messages", fields(&[("text", json!("hi"))]))
            .unwrap();
        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 1);

        store
            .append("room/messages", fields(&[("text", json!("hey"))]))
            .unwrap();
        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 2);
        assert!(snap[0].created_at < snap[1].created_at);
        assert_eq!(snap[0].fields["text"], json!("hi"));
        assert_eq!(snap[1].fields["text"], json!("hey"));
    }

    #[tokio::test]
    async fn drop_detaches_watcher() {
        let store = MemoryStore::new();
        let sub = store.subscribe_ordered("room/messages");
        assert_eq!(store.watcher_count("room/messages"), 1);

        drop(sub);
        assert_eq!(store.watcher_count("room/messages"), 0);

        // Appending after detach must not deliver anywhere or panic.
        store
            .append("room/messages", fields(&[("text", json!("late"))]))
            .unwrap();
    }

    #[test]
    fn fault_is_one_shot() {
        let store = MemoryStore::new();
        store.fail_next_write_to("items");

        let err = store.append("items", Fields::new()).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(_)));

        store.append("items", Fields::new()).unwrap();
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::catalog::Vehicle;
use crate::models::chat::{ChatMessage, SessionKey};

/// Everything remembered about one conversation: the append-only
/// transcript and the most recently recommended vehicle (an owned copy).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub messages: Vec<ChatMessage>,
    pub last_vehicle: Option<Vehicle>,
}

/// Thread-safe in-memory session store, sharded by session key.
///
/// Mutations on the same key are serialized by the shard lock of the
/// `entry` API; operations on different keys do not contend. Every method
/// is synchronous and returns owned snapshots, so no store lock is ever
/// held across an await point.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<SessionKey, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        info!("initializing session store");
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Snapshot of the session transcript, creating an empty session on
    /// first contact. Mutating the returned vector does not touch the
    /// store.
    pub fn history(&self, key: &str) -> Vec<ChatMessage> {
        self.sessions
            .entry(key.to_owned())
            .or_default()
            .messages
            .clone()
    }

    /// Atomically append one message, creating the session if absent.
    pub fn append(&self, key: &str, message: ChatMessage) {
        self.sessions
            .entry(key.to_owned())
            .or_default()
            .messages
            .push(message);
    }

    /// Remember the vehicle currently under discussion for this session.
    pub fn set_last_vehicle(&self, key: &str, vehicle: Vehicle) {
        self.sessions
            .entry(key.to_owned())
            .or_default()
            .last_vehicle = Some(vehicle);
    }

    /// The vehicle currently under discussion, `None` until the first
    /// `set_last_vehicle` for this key.
    pub fn last_vehicle(&self, key: &str) -> Option<Vehicle> {
        self.sessions
            .get(key)
            .and_then(|state| state.last_vehicle.clone())
    }

    /// Drop all state for the key. Idempotent: removing an unknown key is
    /// not an error.
    pub fn remove(&self, key: &str) {
        if self.sessions.remove(key).is_some() {
            debug!(session = key, "session evicted");
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_basic_operations() {
        let store = SessionStore::new();

        store.append("alice", ChatMessage::user("hola"));
        store.append("alice", ChatMessage::assistant("¡hola!"));

        let history = store.history("alice");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "¡hola!");

        store.remove("alice");
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_creates_empty_session() {
        let store = SessionStore::new();
        assert!(store.history("fresh").is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let store = SessionStore::new();
        store.append("alice", ChatMessage::user("hola"));

        let mut history = store.history("alice");
        history.push(ChatMessage::user("intruso"));
        history[0].content.clear();

        let fresh = store.history("alice");
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].content, "hola");
    }

    #[test]
    fn test_append_preserves_order_per_key() {
        let store = SessionStore::new();
        for i in 0..5 {
            store.append("alice", ChatMessage::user(format!("msg-{i}")));
        }
        let contents: Vec<String> = store
            .history("alice")
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]);
    }

    #[test]
    fn test_last_vehicle_roundtrip_and_eviction() {
        let store = SessionStore::new();
        assert!(store.last_vehicle("alice").is_none());

        let vehicle = sample_vehicle();
        store.set_last_vehicle("alice", vehicle.clone());
        assert_eq!(store.last_vehicle("alice"), Some(vehicle));

        store.remove("alice");
        assert!(store.last_vehicle("alice").is_none());

        // removing again is a no-op
        store.remove("alice");
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let store = SessionStore::new();

        std::thread::scope(|scope| {
            for i in 0..100 {
                let store = store.clone();
                scope.spawn(move || {
                    store.append("shared", ChatMessage::user(format!("msg-{i}")));
                });
            }
        });

        let history = store.history("shared");
        assert_eq!(history.len(), 100);

        let mut contents: Vec<String> =
            history.into_iter().map(|m| m.content).collect();
        contents.sort();
        let mut expected: Vec<String> = (0..100).map(|i| format!("msg-{i}")).collect();
        expected.sort();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_appends_to_other_keys_do_not_interleave() {
        let store = SessionStore::new();
        store.append("alice", ChatMessage::user("uno"));

        std::thread::scope(|scope| {
            for i in 0..50 {
                let store = store.clone();
                scope.spawn(move || {
                    store.append(&format!("other-{i}"), ChatMessage::user("ruido"));
                });
            }
        });

        store.append("alice", ChatMessage::user("dos"));
        let contents: Vec<String> = store
            .history("alice")
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["uno", "dos"]);
    }

    fn sample_vehicle() -> Vehicle {
        Vehicle {
            stock_id: "KAV-1001".to_string(),
            km: 77_400,
            price: 461_999.0,
            make: "Volkswagen".to_string(),
            model: "Touareg".to_string(),
            year: 2018,
            version: "Wolfsburg Edition".to_string(),
            bluetooth: true,
            car_play: false,
            length_m: 4.8,
            width_m: 1.94,
            height_m: 1.73,
        }
    }
}

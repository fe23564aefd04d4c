//! In-memory collaboration hub: one shared stroke map and one broadcast
//! channel, with any number of client handles.
//!
//! All handles created from the same [`MemoryHub`] see the same totally
//! ordered history of map operations and broadcast messages. A handle only
//! observes history recorded after it was created.

use crate::sync::{IncomingMessage, MapChange, SharedStrokeMap, UserRole, WetInkChannel};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A sequenced operation on the shared map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapOp {
    Set { key: String, value: String },
    /// Tombstone for `key`
    Delete { key: String },
    Clear,
}

#[derive(Debug, Clone)]
struct SequencedOp {
    origin: usize,
    op: MapOp,
}

#[derive(Debug, Clone)]
struct Broadcast {
    origin: usize,
    role: UserRole,
    payload: String,
}

#[derive(Debug, Default)]
struct HubState {
    /// Current map contents in first-insertion order
    entries: Vec<(String, String)>,
    ops: Vec<SequencedOp>,
    messages: Vec<Broadcast>,
    next_client: usize,
}

impl HubState {
    fn register(&mut self) -> usize {
        let id = self.next_client;
        self.next_client += 1;
        id
    }

    fn apply(&mut self, origin: usize, op: MapOp) {
        match &op {
            MapOp::Set { key, value } => {
                match self.entries.iter_mut().find(|(existing, _)| existing == key) {
                    Some(entry) => entry.1 = value.clone(),
                    None => self.entries.push((key.clone(), value.clone())),
                }
            }
            MapOp::Delete { key } => self.entries.retain(|(existing, _)| existing != key),
            MapOp::Clear => self.entries.clear(),
        }
        self.ops.push(SequencedOp { origin, op });
    }
}

/// Shared state behind every map and channel handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    state: Rc<RefCell<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new client handle on the shared map.
    pub fn map(&self) -> MemoryMap {
        let mut state = self.state.borrow_mut();
        MemoryMap {
            hub: self.state.clone(),
            client: state.register(),
            cursor: state.ops.len(),
        }
    }

    /// A new client handle on the broadcast channel, sending as `role`.
    pub fn channel(&self, role: UserRole) -> MemoryChannel {
        let mut state = self.state.borrow_mut();
        MemoryChannel {
            hub: self.state.clone(),
            client: state.register(),
            role,
            cursor: state.messages.len(),
        }
    }

    /// Total number of map operations recorded.
    pub fn op_count(&self) -> usize {
        self.state.borrow().ops.len()
    }

    /// Total number of broadcast messages sent.
    pub fn message_count(&self) -> usize {
        self.state.borrow().messages.len()
    }

    /// Map operations recorded so far, oldest first.
    pub fn ops(&self) -> Vec<MapOp> {
        self.state.borrow().ops.iter().map(|s| s.op.clone()).collect()
    }
}

/// One client's view of the shared map.
#[derive(Debug)]
pub struct MemoryMap {
    hub: Rc<RefCell<HubState>>,
    client: usize,
    cursor: usize,
}

impl SharedStrokeMap for MemoryMap {
    fn get(&self, key: &str) -> Option<String> {
        self.hub
            .borrow()
            .entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.clone())
    }

    fn set(&mut self, key: &str, value: String) {
        self.hub.borrow_mut().apply(self.client, MapOp::Set { key: key.to_string(), value });
    }

    fn delete(&mut self, key: &str) {
        self.hub.borrow_mut().apply(self.client, MapOp::Delete { key: key.to_string() });
    }

    fn clear(&mut self) {
        self.hub.borrow_mut().apply(self.client, MapOp::Clear);
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.hub.borrow().entries.clone()
    }

    fn poll_changes(&mut self) -> Vec<MapChange> {
        let state = self.hub.borrow();
        let changes = state.ops[self.cursor..]
            .iter()
            .map(|sequenced| {
                let local = sequenced.origin == self.client;
                match &sequenced.op {
                    MapOp::Set { key, .. } | MapOp::Delete { key } => {
                        MapChange::ValueChanged { key: key.clone(), local }
                    }
                    MapOp::Clear => MapChange::Cleared { local },
                }
            })
            .collect();
        self.cursor = state.ops.len();
        changes
    }
}

/// One client's view of the broadcast channel.
#[derive(Debug)]
pub struct MemoryChannel {
    hub: Rc<RefCell<HubState>>,
    client: usize,
    role: UserRole,
    cursor: usize,
}

impl MemoryChannel {
    pub fn role(&self) -> UserRole {
        self.role
    }
}

impl WetInkChannel for MemoryChannel {
    fn send(&mut self, payload: String) {
        self.hub.borrow_mut().messages.push(Broadcast {
            origin: self.client,
            role: self.role,
            payload,
        });
    }

    fn poll(&mut self) -> Vec<IncomingMessage> {
        let state = self.hub.borrow();
        let messages = state.messages[self.cursor..]
            .iter()
            .map(|message| IncomingMessage {
                payload: message.payload.clone(),
                sender_role: Some(message.role),
                local: message.origin == self.client,
            })
            .collect();
        self.cursor = state.messages.len();
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_changes_carry_local_flag() {
        let hub = MemoryHub::new();
        let mut a = hub.map();
        let mut b = hub.map();

        a.set("k", "1".to_string());
        b.delete("k");
        a.clear();

        assert_eq!(
            a.poll_changes(),
            vec![
                MapChange::ValueChanged { key: "k".to_string(), local: true },
                MapChange::ValueChanged { key: "k".to_string(), local: false },
                MapChange::Cleared { local: true },
            ]
        );
        assert!(a.poll_changes().is_empty());
        assert_eq!(b.poll_changes().len(), 3);
        assert_eq!(hub.ops().last(), Some(&MapOp::Clear));
    }

    #[test]
    fn test_map_values_and_order() {
        let hub = MemoryHub::new();
        let mut map = hub.map();
        map.set("b", "1".to_string());
        map.set("a", "2".to_string());
        map.set("b", "3".to_string());

        assert_eq!(map.get("b").as_deref(), Some("3"));
        let keys: Vec<String> = map.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);

        map.delete("b");
        assert!(map.get("b").is_none());
    }

    #[test]
    fn test_late_handles_skip_history() {
        let hub = MemoryHub::new();
        let mut early = hub.map();
        early.set("k", "v".to_string());

        let mut late = hub.map();
        assert!(late.poll_changes().is_empty());
        assert_eq!(late.entries().len(), 1);
    }

    #[test]
    fn test_broadcast_delivery() {
        let hub = MemoryHub::new();
        let mut presenter = hub.channel(UserRole::Presenter);
        let mut guest = hub.channel(UserRole::Guest);

        presenter.send("hello".to_string());
        let received = guest.poll();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].sender_role, Some(UserRole::Presenter));
        assert!(!received[0].local);

        let echoed = presenter.poll();
        assert!(echoed[0].local);
        assert_eq!(hub.message_count(), 1);
    }

    #[test]
    fn test_map_op_json() {
        let json = serde_json::to_string(&MapOp::Delete { key: "k".to_string() }).unwrap();
        assert_eq!(json, r#"{"type":"delete","key":"k"}"#);
    }
}

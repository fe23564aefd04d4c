//! Collaborative inking session.
//!
//! Committed ("dry") strokes are stored in a shared key-value map, one JSON
//! value per stroke id. In-progress ("wet") strokes are mirrored to peers
//! through an ephemeral broadcast channel so they appear while being drawn.
//!
//! Remote dry changes are applied through the manager's peer path, which
//! bypasses its change log. Local changes still pending in that log (for
//! example during a point erase gesture or an update batch) are therefore
//! neither flushed early nor mixed up with remote ones.

use crate::batch::{PointBatch, PointBatcher};
use crate::brush::Brush;
use crate::config::SyncConfig;
use crate::geometry::PointerPoint;
use crate::manager::{InkEvent, InkingManager};
use crate::scheduler::{Instant, IntervalTimer};
use crate::stroke::{Stroke, StrokeId, StrokeOptions};
use crate::tools::InkingTool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Meeting role of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Guest,
    Attendee,
    Organizer,
    Presenter,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Guest,
        UserRole::Attendee,
        UserRole::Organizer,
        UserRole::Presenter,
    ];
}

/// A change observed on the shared stroke map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapChange {
    /// The value under `key` was set or deleted
    ValueChanged { key: String, local: bool },
    Cleared { local: bool },
}

/// Shared key-value map holding serialized dry strokes.
pub trait SharedStrokeMap {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn delete(&mut self, key: &str);

    fn clear(&mut self);

    fn entries(&self) -> Vec<(String, String)>;

    /// Changes since the last poll, in document order.
    fn poll_changes(&mut self) -> Vec<MapChange>;
}

/// A message received on the wet ink channel.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub payload: String,
    /// Role of the sender, if the transport knows it
    pub sender_role: Option<UserRole>,
    /// The message was sent by this client
    pub local: bool,
}

/// Ephemeral broadcast channel for wet ink.
pub trait WetInkChannel {
    fn send(&mut self, payload: String);

    fn poll(&mut self) -> Vec<IncomingMessage>;
}

/// Wet ink broadcast messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WetInkMessage {
    #[serde(rename_all = "camelCase")]
    Begin {
        stroke_id: StrokeId,
        tool: InkingTool,
        brush: Brush,
        start_point: PointerPoint,
    },
    #[serde(rename_all = "camelCase")]
    Add {
        stroke_id: StrokeId,
        points: Vec<PointerPoint>,
    },
    #[serde(rename_all = "camelCase")]
    End {
        stroke_id: StrokeId,
        end_point: PointerPoint,
    },
}

impl From<PointBatch> for WetInkMessage {
    fn from(batch: PointBatch) -> Self {
        WetInkMessage::Add { stroke_id: batch.stroke_id, points: batch.points }
    }
}

/// Keeps an [`InkingManager`] in sync with peers.
pub struct SharedInkingSession<M, C> {
    manager: InkingManager,
    map: M,
    channel: C,
    config: SyncConfig,
    batcher: PointBatcher,
    /// Remote wet strokes and the last time they were heard from
    remote_wet_strokes: HashMap<StrokeId, Instant>,
    stale_check: IntervalTimer,
}

impl<M: SharedStrokeMap, C: WetInkChannel> SharedInkingSession<M, C> {
    /// Attach `manager` to the shared document, loading existing strokes.
    pub fn synchronize(manager: InkingManager, map: M, channel: C, config: SyncConfig) -> Self {
        let batcher = PointBatcher::new(config.batch_window())
            .with_reduction(config.point_reduction_threshold);
        let stale_check = IntervalTimer::new(config.stale_check_interval());

        let mut session = Self {
            manager,
            map,
            channel,
            config,
            batcher,
            remote_wet_strokes: HashMap::new(),
            stale_check,
        };
        session.load_existing_strokes();
        session
    }

    pub fn manager(&self) -> &InkingManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut InkingManager {
        &mut self.manager
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn allowed_roles(&self) -> &[UserRole] {
        &self.config.allowed_roles
    }

    pub fn set_allowed_roles(&mut self, roles: Vec<UserRole>) {
        self.config.allowed_roles = roles;
    }

    /// Number of remote wet strokes currently displayed.
    pub fn remote_wet_stroke_count(&self) -> usize {
        self.remote_wet_strokes.len()
    }

    /// Send local changes, apply remote ones, collect stale wet strokes and
    /// drive the manager's frame.
    pub fn tick(&mut self, now: Instant) {
        self.publish_local_events(now);
        if let Some(batch) = self.batcher.flush_due(now) {
            self.send(batch.into());
        }

        self.apply_remote_dry_changes();
        self.apply_remote_wet_messages(now);
        self.collect_stale_wet_strokes(now);

        self.manager.tick(now);
    }

    /// Push every pending local manager event to peers.
    pub fn publish_local_events(&mut self, now: Instant) {
        for event in self.manager.take_events() {
            self.publish_event(event, now);
        }
    }

    fn load_existing_strokes(&mut self) {
        let entries = self.map.entries();
        log::info!("loading {} shared strokes", entries.len());

        for (key, value) in entries {
            match Stroke::deserialize(&value) {
                Ok(stroke) => self.manager.apply_remote_stroke(stroke),
                Err(e) => log::debug!("dropping malformed stroke {key}: {e}"),
            }
        }
    }

    fn publish_event(&mut self, event: InkEvent, now: Instant) {
        match event {
            InkEvent::StrokesAdded(strokes) => {
                for stroke in strokes {
                    match stroke.serialize() {
                        Ok(json) => self.map.set(stroke.id(), json),
                        Err(e) => log::warn!("failed to serialize stroke {}: {e}", stroke.id()),
                    }
                }
            }
            InkEvent::StrokesRemoved(ids) => {
                for id in ids {
                    self.map.delete(&id);
                }
            }
            InkEvent::Cleared => self.map.clear(),
            InkEvent::BeginStroke { tool, stroke_id, brush, start_point } => {
                if let Some(batch) = self.batcher.flush() {
                    self.send(batch.into());
                }
                self.send(WetInkMessage::Begin { stroke_id, tool, brush, start_point });
            }
            InkEvent::AddPoint { stroke_id, point } => {
                for batch in self.batcher.push(&stroke_id, point, now) {
                    self.send(batch.into());
                }
            }
            InkEvent::EndStroke { stroke_id, point } => {
                if let Some(batch) = self.batcher.flush_stroke(&stroke_id) {
                    self.send(batch.into());
                }
                self.send(WetInkMessage::End { stroke_id, end_point: point });
            }
        }
    }

    fn send(&mut self, message: WetInkMessage) {
        match serde_json::to_string(&message) {
            Ok(json) => self.channel.send(json),
            Err(e) => log::warn!("failed to encode wet ink message: {e}"),
        }
    }

    fn apply_remote_dry_changes(&mut self) {
        for change in self.map.poll_changes() {
            match change {
                MapChange::ValueChanged { local: true, .. } | MapChange::Cleared { local: true } => {}
                MapChange::ValueChanged { key, local: false } => match self.map.get(&key) {
                    Some(json) => match Stroke::deserialize(&json) {
                        Ok(stroke) => self.manager.apply_remote_stroke(stroke),
                        Err(e) => log::debug!("dropping malformed stroke {key}: {e}"),
                    },
                    None => {
                        self.manager.apply_remote_removal(&key);
                    }
                },
                MapChange::Cleared { local: false } => self.manager.apply_remote_clear(),
            }
        }
    }

    fn apply_remote_wet_messages(&mut self, now: Instant) {
        for message in self.channel.poll() {
            if message.local {
                continue;
            }
            let allowed = message
                .sender_role
                .is_some_and(|role| self.config.allowed_roles.contains(&role));
            if !allowed {
                log::debug!("ignoring wet ink from role {:?}", message.sender_role);
                continue;
            }

            match serde_json::from_str::<WetInkMessage>(&message.payload) {
                Ok(decoded) => self.apply_wet_message(decoded, now),
                Err(e) => log::debug!("dropping malformed wet ink message: {e}"),
            }
        }
    }

    fn apply_wet_message(&mut self, message: WetInkMessage, now: Instant) {
        match message {
            WetInkMessage::Begin { stroke_id, tool, brush, start_point } => {
                let options = StrokeOptions::default().with_id(stroke_id.clone()).with_brush(brush);
                match self.manager.begin_wet_stroke(tool, start_point, options) {
                    Ok(id) => {
                        self.remote_wet_strokes.insert(id, now);
                        self.stale_check.start();
                    }
                    Err(e) => log::debug!("dropping wet stroke {stroke_id}: {e}"),
                }
            }
            WetInkMessage::Add { stroke_id, points } => {
                let Some(last_seen) = self.remote_wet_strokes.get_mut(&stroke_id) else {
                    log::debug!("points for unknown wet stroke {stroke_id}");
                    return;
                };
                *last_seen = now;
                if let Err(e) = self.manager.add_wet_stroke_points(&stroke_id, &points) {
                    log::debug!("{e}");
                }
            }
            WetInkMessage::End { stroke_id, end_point } => {
                if self.remote_wet_strokes.remove(&stroke_id).is_none() {
                    log::debug!("end for unknown wet stroke {stroke_id}");
                    return;
                }
                if let Err(e) = self.manager.end_wet_stroke(&stroke_id, end_point) {
                    log::debug!("{e}");
                }
            }
        }
    }

    fn collect_stale_wet_strokes(&mut self, now: Instant) {
        if self.stale_check.poll(now) == 0 {
            return;
        }

        let timeout = self.config.stale_wet_stroke_timeout();
        let stale: Vec<StrokeId> = self
            .remote_wet_strokes
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in stale {
            log::info!("wet stroke {id} expired");
            self.remote_wet_strokes.remove(&id);
            if let Err(e) = self.manager.cancel_wet_stroke(&id) {
                log::debug!("{e}");
            }
        }

        if self.remote_wet_strokes.is_empty() {
            self.stale_check.stop();
        }
    }
}

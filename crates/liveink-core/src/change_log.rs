//! Batching of stroke additions and removals before they are announced.

use crate::stroke::{Stroke, StrokeId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct PendingAdd {
    stroke: Stroke,
    /// The id was already committed before this addition
    replaces: bool,
}

/// Pending additions and removals, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    added: HashMap<StrokeId, PendingAdd>,
    added_order: Vec<StrokeId>,
    removed: Vec<StrokeId>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.added.clear();
        self.added_order.clear();
        self.removed.clear();
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Record an addition. `replaces` tells whether a stroke with the same
    /// id was already committed.
    pub fn add_stroke(&mut self, stroke: Stroke, replaces: bool) {
        let id = stroke.id().to_string();
        match self.added.get_mut(&id) {
            Some(pending) => pending.stroke = stroke,
            None => {
                self.added_order.push(id.clone());
                self.added.insert(id, PendingAdd { stroke, replaces });
            }
        }
    }

    /// Record a removal. Removing a stroke whose addition is still pending
    /// and which was never committed before cancels out.
    pub fn remove_stroke(&mut self, id: &str) {
        if let Some(pending) = self.added.remove(id) {
            self.added_order.retain(|added| added != id);
            if !pending.replaces {
                return;
            }
        }
        if !self.removed.iter().any(|removed| removed == id) {
            self.removed.push(id.to_string());
        }
    }

    /// Fold `other` into this log: removals first, then additions.
    pub fn merge(&mut self, other: ChangeLog) {
        let ChangeLog { mut added, added_order, removed } = other;
        for id in &removed {
            self.remove_stroke(id);
        }
        for id in added_order {
            if let Some(pending) = added.remove(&id) {
                self.add_stroke(pending.stroke, pending.replaces);
            }
        }
    }

    pub fn removed_strokes(&self) -> &[StrokeId] {
        &self.removed
    }

    pub fn added_strokes(&self) -> Vec<Stroke> {
        self.added_order
            .iter()
            .filter_map(|id| self.added.get(id))
            .map(|pending| pending.stroke.clone())
            .collect()
    }

    /// Drain the log into `(removed ids, added strokes)`.
    pub fn take(&mut self) -> (Vec<StrokeId>, Vec<Stroke>) {
        let added = self.added_strokes();
        let removed = std::mem::take(&mut self.removed);
        self.clear();
        (removed, added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeOptions;

    fn stroke(id: &str) -> Stroke {
        Stroke::new(StrokeOptions::default().with_id(id))
    }

    #[test]
    fn test_remove_cancels_fresh_add() {
        let mut log = ChangeLog::new();
        log.add_stroke(stroke("a"), false);
        log.remove_stroke("a");
        assert!(!log.has_changes());
    }

    #[test]
    fn test_remove_replaced_stroke_is_kept() {
        let mut log = ChangeLog::new();
        log.add_stroke(stroke("a"), true);
        log.remove_stroke("a");
        assert!(log.added_strokes().is_empty());
        assert_eq!(log.removed_strokes(), ["a".to_string()]);
    }

    #[test]
    fn test_merge_removals_then_additions() {
        let mut log = ChangeLog::new();
        log.add_stroke(stroke("a"), false);
        log.remove_stroke("old");

        let mut erase = ChangeLog::new();
        erase.remove_stroke("a");
        erase.add_stroke(stroke("a1"), false);
        erase.add_stroke(stroke("a2"), false);
        log.merge(erase);

        let added: Vec<String> = log.added_strokes().iter().map(|s| s.id().to_string()).collect();
        assert_eq!(added, vec!["a1", "a2"]);
        assert_eq!(log.removed_strokes(), ["old".to_string()]);

        let (removed, added) = log.take();
        assert_eq!(removed.len(), 1);
        assert_eq!(added.len(), 2);
        assert!(!log.has_changes());
    }

    #[test]
    fn test_duplicate_removal_recorded_once() {
        let mut log = ChangeLog::new();
        log.remove_stroke("a");
        log.remove_stroke("a");
        assert_eq!(log.removed_strokes().len(), 1);
    }
}

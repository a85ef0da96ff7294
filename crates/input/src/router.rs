use crate::action::{Action, mouse_turn_axis};
use cubefield_common::Movement;
use std::collections::{HashMap, VecDeque};

/// Name of a logical key, case-insensitive ("w", "arrowup", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalKey(String);

impl LogicalKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LogicalKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<char> for LogicalKey {
    fn from(c: char) -> Self {
        Self::new(c.to_string())
    }
}

impl std::fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle returned by [`InputRouter::subscribe`].
///
/// Becomes stale once the same key is subscribed again; unsubscribing a
/// stale handle leaves the newer binding in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    key: LogicalKey,
    id: u64,
}

impl Subscription {
    pub fn key(&self) -> &LogicalKey {
        &self.key
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    id: u64,
    movement: Movement,
}

/// Routes raw key and mouse events to queued camera [`Action`]s.
///
/// Events may arrive at any point between frames. They are queued here and
/// only reach the camera when the frame driver calls [`InputRouter::drain`],
/// so camera state never changes in the middle of an update.
///
/// Several keys may drive one movement. The movement starts with the first
/// of them pressed and stops with the last one released.
#[derive(Debug, Default)]
pub struct InputRouter {
    bindings: HashMap<LogicalKey, Binding>,
    /// Held keys and the movement each was bound to when pressed.
    held: HashMap<LogicalKey, Movement>,
    holders: HashMap<Movement, usize>,
    pending: VecDeque<Action>,
    pointer_captured: bool,
    next_id: u64,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with w/a/s/d bound to forward/left/backward/right.
    pub fn with_default_bindings() -> Self {
        let mut router = Self::new();
        for (key, movement) in [
            ('w', Movement::Forward),
            ('a', Movement::Left),
            ('s', Movement::Backward),
            ('d', Movement::Right),
        ] {
            let _ = router.subscribe(key, movement);
        }
        router
    }

    /// Bind `key` to `movement`, superseding any earlier binding of that key.
    ///
    /// If the key is held while its binding is replaced, it is released from
    /// the old movement first, queueing a stop unless another key still holds
    /// that movement.
    pub fn subscribe(&mut self, key: impl Into<LogicalKey>, movement: Movement) -> Subscription {
        let key = key.into();
        self.next_id += 1;
        let id = self.next_id;

        if let Some(previous) = self.bindings.insert(key.clone(), Binding { id, movement }) {
            tracing::debug!(
                "key '{key}' rebound from {} to {movement}",
                previous.movement
            );
            self.unhold(&key);
        } else {
            tracing::debug!("key '{key}' bound to {movement}");
        }

        Subscription { key, id }
    }

    /// Remove the binding created by `subscription`. Returns false when the
    /// handle is stale or was already cancelled.
    pub fn unsubscribe(&mut self, subscription: &Subscription) -> bool {
        if self.bindings.get(&subscription.key).map(|b| b.id) != Some(subscription.id) {
            return false;
        }
        if self.bindings.remove(&subscription.key).is_none() {
            return false;
        }
        self.unhold(&subscription.key);
        tracing::debug!("key '{}' unbound", subscription.key);
        true
    }

    /// Movement currently bound to `key`.
    pub fn binding(&self, key: impl Into<LogicalKey>) -> Option<Movement> {
        self.bindings.get(&key.into()).map(|b| b.movement)
    }

    /// Number of bound keys.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Handle a key press. OS key-repeat, unbound keys and keys whose
    /// movement is already held by another key queue nothing.
    /// Returns true if an action was queued.
    pub fn key_down(&mut self, key: impl Into<LogicalKey>) -> bool {
        let key = key.into();
        let Some(binding) = self.bindings.get(&key).copied() else {
            return false;
        };
        if self.held.contains_key(&key) {
            return false;
        }
        self.held.insert(key, binding.movement);
        let holders = self.holders.entry(binding.movement).or_insert(0);
        *holders += 1;
        if *holders > 1 {
            return false;
        }
        self.pending.push_back(Action::Move(binding.movement));
        true
    }

    /// Handle a key release. Releasing a key that is not held, or one whose
    /// movement is still held by another key, queues nothing.
    pub fn key_up(&mut self, key: impl Into<LogicalKey>) -> bool {
        self.unhold(&key.into())
    }

    /// Drop `key` from the held set; queues a stop when it was the last
    /// holder of its movement.
    fn unhold(&mut self, key: &LogicalKey) -> bool {
        let Some(movement) = self.held.remove(key) else {
            return false;
        };
        let Some(holders) = self.holders.get_mut(&movement) else {
            return false;
        };
        *holders = holders.saturating_sub(1);
        if *holders > 0 {
            return false;
        }
        self.holders.remove(&movement);
        self.pending.push_back(Action::Stop(movement));
        true
    }

    /// Handle relative mouse motion in pixels. Ignored unless the pointer is
    /// captured. Consecutive turns between two drains are summed into one.
    pub fn mouse_moved(&mut self, dx: f32, dy: f32) -> bool {
        if !self.pointer_captured || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        let axis = mouse_turn_axis(dx, dy);
        if let Some(Action::Turn(pending)) = self.pending.back_mut() {
            *pending += axis;
        } else {
            self.pending.push_back(Action::Turn(axis));
        }
        true
    }

    pub fn set_pointer_captured(&mut self, captured: bool) {
        if self.pointer_captured != captured {
            tracing::debug!("pointer captured: {captured}");
        }
        self.pointer_captured = captured;
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.pointer_captured
    }

    /// Release every held key, e.g. when the window loses focus and the
    /// matching key-up events will never arrive.
    pub fn release_all(&mut self) {
        let mut held: Vec<LogicalKey> = self.held.keys().cloned().collect();
        held.sort();
        for key in held {
            self.unhold(&key);
        }
    }

    pub fn is_held(&self, key: impl Into<LogicalKey>) -> bool {
        self.held.contains_key(&key.into())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Take every queued action in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn drained(router: &mut InputRouter) -> Vec<Action> {
        router.drain().collect()
    }

    #[test]
    fn default_bindings_cover_wasd() {
        let router = InputRouter::with_default_bindings();
        assert_eq!(router.binding_count(), 4);
        assert_eq!(router.binding('w'), Some(Movement::Forward));
        assert_eq!(router.binding('a'), Some(Movement::Left));
        assert_eq!(router.binding('s'), Some(Movement::Backward));
        assert_eq!(router.binding('D'), Some(Movement::Right));
    }

    #[test]
    fn press_and_release_queue_move_and_stop() {
        let mut router = InputRouter::with_default_bindings();
        assert!(router.key_down('w'));
        assert!(router.key_up('w'));
        assert_eq!(
            drained(&mut router),
            vec![Action::Move(Movement::Forward), Action::Stop(Movement::Forward)]
        );
    }

    #[test]
    fn key_repeat_is_suppressed() {
        let mut router = InputRouter::with_default_bindings();
        assert!(router.key_down('w'));
        assert!(!router.key_down('w'));
        assert!(!router.key_down("W"));
        assert_eq!(drained(&mut router), vec![Action::Move(Movement::Forward)]);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut router = InputRouter::with_default_bindings();
        assert!(!router.key_up('a'));
        assert_eq!(router.pending_len(), 0);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut router = InputRouter::with_default_bindings();
        assert!(!router.key_down('q'));
        assert!(!router.is_held('q'));
    }

    #[test]
    fn resubscribe_replaces_binding() {
        let mut router = InputRouter::new();
        let first = router.subscribe('w', Movement::Forward);
        let second = router.subscribe('w', Movement::Backward);
        assert_eq!(router.binding_count(), 1);
        assert_eq!(router.binding('w'), Some(Movement::Backward));

        // A single press yields a single action: no ghost handler.
        assert!(router.key_down('w'));
        assert_eq!(drained(&mut router), vec![Action::Move(Movement::Backward)]);

        assert!(!router.unsubscribe(&first));
        assert_eq!(router.binding('w'), Some(Movement::Backward));
        assert!(router.unsubscribe(&second));
        assert_eq!(router.binding('w'), None);
    }

    #[test]
    fn rebinding_a_held_key_stops_old_movement() {
        let mut router = InputRouter::new();
        let _ = router.subscribe('w', Movement::Forward);
        router.key_down('w');
        let _ = router.subscribe('w', Movement::Left);
        assert!(!router.is_held('w'));
        assert_eq!(
            drained(&mut router),
            vec![Action::Move(Movement::Forward), Action::Stop(Movement::Forward)]
        );
    }

    #[test]
    fn unsubscribe_held_key_stops_movement() {
        let mut router = InputRouter::new();
        let sub = router.subscribe('d', Movement::Right);
        router.key_down('d');
        assert!(router.unsubscribe(&sub));
        assert!(!router.unsubscribe(&sub));
        assert_eq!(
            drained(&mut router),
            vec![Action::Move(Movement::Right), Action::Stop(Movement::Right)]
        );
    }

    #[test]
    fn two_keys_share_one_movement() {
        let mut router = InputRouter::with_default_bindings();
        let _ = router.subscribe("arrowup", Movement::Forward);

        assert!(router.key_down('w'));
        assert!(!router.key_down("arrowup"));
        assert!(!router.key_up("arrowup"));
        assert!(router.is_held('w'));
        assert_eq!(drained(&mut router), vec![Action::Move(Movement::Forward)]);

        assert!(router.key_up('w'));
        assert_eq!(drained(&mut router), vec![Action::Stop(Movement::Forward)]);
    }

    #[test]
    fn rebinding_one_of_two_holders_keeps_movement() {
        let mut router = InputRouter::with_default_bindings();
        let _ = router.subscribe("arrowup", Movement::Forward);
        router.key_down('w');
        router.key_down("arrowup");
        let _ = drained(&mut router);

        let _ = router.subscribe("arrowup", Movement::Left);
        assert_eq!(router.pending_len(), 0);
        router.release_all();
        assert_eq!(drained(&mut router), vec![Action::Stop(Movement::Forward)]);
    }

    #[test]
    fn mouse_ignored_until_captured() {
        let mut router = InputRouter::new();
        assert!(!router.mouse_moved(4.0, 1.0));
        router.set_pointer_captured(true);
        assert!(router.mouse_moved(4.0, 1.0));
        assert_eq!(drained(&mut router), vec![Action::Turn(Vec3::new(1.0, 4.0, 0.0))]);
    }

    #[test]
    fn zero_mouse_delta_is_ignored() {
        let mut router = InputRouter::new();
        router.set_pointer_captured(true);
        assert!(!router.mouse_moved(0.0, 0.0));
    }

    #[test]
    fn consecutive_turns_coalesce() {
        let mut router = InputRouter::with_default_bindings();
        router.set_pointer_captured(true);
        router.mouse_moved(1.0, 0.0);
        router.mouse_moved(2.0, 1.0);
        router.key_down('s');
        router.mouse_moved(0.0, -1.0);
        assert_eq!(
            drained(&mut router),
            vec![
                Action::Turn(Vec3::new(1.0, 3.0, 0.0)),
                Action::Move(Movement::Backward),
                Action::Turn(Vec3::new(-1.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn release_all_stops_held_movements() {
        let mut router = InputRouter::with_default_bindings();
        router.key_down('w');
        router.key_down('a');
        let _ = drained(&mut router);
        router.release_all();
        assert_eq!(
            drained(&mut router),
            vec![Action::Stop(Movement::Left), Action::Stop(Movement::Forward)]
        );
        assert!(!router.is_held('w'));
    }
}

//! Discrete input events and the per-frame queue that decouples window
//! callbacks from the simulation step. Callbacks push `SceneInput` values;
//! the frame step drains the queue once, folding key transitions into
//! `MovementIntent` and handing clicks to the pick handler.

use std::sync::mpsc::{self, Receiver, Sender};

/// The four movement keys the camera controller reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
}

/// Held-key flags, one per movement key. Key-down and key-up are idempotent
/// flag sets, so repeats need no debouncing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementIntent {
    pub fn apply_key(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Backward => self.backward = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
        }
    }

    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right)
    }
}

/// A pointer click in physical pixels, paired with the viewport size the
/// pick handler needs for NDC conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerClick {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneInput {
    Key { key: MoveKey, pressed: bool },
    Click(PointerClick),
}

/// Unbounded single-consumer queue of input events. The window loop pushes,
/// the frame step drains; both run on the same thread, so the channel is
/// purely an ordering device.
pub struct InputQueue {
    tx: Sender<SceneInput>,
    rx: Receiver<SceneInput>,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn push(&self, event: SceneInput) {
        // The receiver lives as long as the queue, so this cannot fail.
        let _ = self.tx.send(event);
    }

    /// Drain every queued event in arrival order: key transitions update
    /// `intent` in place, clicks are returned for the pick handler.
    pub fn drain_into(&self, intent: &mut MovementIntent) -> Vec<PointerClick> {
        let mut clicks = Vec::new();
        for event in self.rx.try_iter() {
            match event {
                SceneInput::Key { key, pressed } => intent.apply_key(key, pressed),
                SceneInput::Click(click) => clicks.push(click),
            }
        }
        clicks
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;

    #[test]
    fn drain_folds_key_events_in_order() {
        let queue = InputQueue::new();
        let mut intent = MovementIntent::default();

        queue.push(SceneInput::Key {
            key: MoveKey::Forward,
            pressed: true,
        });
        queue.push(SceneInput::Key {
            key: MoveKey::Left,
            pressed: true,
        });
        queue.push(SceneInput::Key {
            key: MoveKey::Forward,
            pressed: false,
        });

        let clicks = queue.drain_into(&mut intent);
        assert!(clicks.is_empty());
        assert!(!intent.forward);
        assert!(intent.left);
    }

    #[test]
    fn drain_returns_clicks_in_arrival_order() {
        let queue = InputQueue::new();
        let mut intent = MovementIntent::default();

        queue.push(SceneInput::Click(PointerClick { x: 10.0, y: 20.0 }));
        queue.push(SceneInput::Key {
            key: MoveKey::Right,
            pressed: true,
        });
        queue.push(SceneInput::Click(PointerClick { x: 30.0, y: 40.0 }));

        let clicks = queue.drain_into(&mut intent);
        assert_eq!(clicks.len(), 2);
        assert_eq!(clicks[0], PointerClick { x: 10.0, y: 20.0 });
        assert_eq!(clicks[1], PointerClick { x: 30.0, y: 40.0 });
        assert!(intent.right);
    }

    #[test]
    fn repeated_key_downs_are_idempotent() {
        let queue = InputQueue::new();
        let mut intent = MovementIntent::default();

        for _ in 0..3 {
            queue.push(SceneInput::Key {
                key: MoveKey::Backward,
                pressed: true,
            });
        }
        queue.drain_into(&mut intent);
        assert!(intent.backward);

        queue.push(SceneInput::Key {
            key: MoveKey::Backward,
            pressed: false,
        });
        queue.drain_into(&mut intent);
        assert!(intent.is_idle());
    }

    #[test]
    fn drain_on_an_empty_queue_is_a_no_op() {
        let queue = InputQueue::new();
        let mut intent = MovementIntent::default();
        assert!(queue.drain_into(&mut intent).is_empty());
        assert!(intent.is_idle());
    }
}

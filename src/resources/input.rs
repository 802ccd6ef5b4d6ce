//! Per-tick input resource.
//!
//! Captures the subset of input the actor states care about and exposes it
//! through the [`InputState`] resource. Polling the actual device is the
//! embedder's job: it reports raw key levels with [`InputState::set`] before
//! each tick, and the session calls [`InputState::latch`] after the tick so
//! edge flags only last one tick.

use bevy_ecs::prelude::*;

/// Logical actions bound to whatever keys the embedder chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Jump,
    Attack,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Boolean key state with edge flags.
pub struct BoolState {
    /// Whether the key is currently held.
    pub active: bool,
    /// Whether the key went down this tick.
    pub just_pressed: bool,
    /// Whether the key went up this tick.
    pub just_released: bool,
}

impl BoolState {
    fn set(&mut self, down: bool) {
        if down && !self.active {
            self.just_pressed = true;
        }
        if !down && self.active {
            self.just_released = true;
        }
        self.active = down;
    }

    fn latch(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Resource capturing the per-tick input state relevant to gameplay.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    pub left: BoolState,
    pub right: BoolState,
    pub jump: BoolState,
    pub attack: BoolState,
}

impl InputState {
    fn slot(&self, action: Action) -> &BoolState {
        match action {
            Action::Left => &self.left,
            Action::Right => &self.right,
            Action::Jump => &self.jump,
            Action::Attack => &self.attack,
        }
    }

    fn slot_mut(&mut self, action: Action) -> &mut BoolState {
        match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Jump => &mut self.jump,
            Action::Attack => &mut self.attack,
        }
    }

    /// Report the raw level of an action's key.
    pub fn set(&mut self, action: Action, down: bool) {
        self.slot_mut(action).set(down);
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.slot(action).active
    }

    pub fn just_pressed(&self, action: Action) -> bool {
        self.slot(action).just_pressed
    }

    pub fn just_released(&self, action: Action) -> bool {
        self.slot(action).just_released
    }

    /// Horizontal intent: -1 left, +1 right, 0 when neither or both are held.
    pub fn horizontal(&self) -> f32 {
        match (self.left.active, self.right.active) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Clear edge flags at the end of a tick.
    pub fn latch(&mut self) {
        self.left.latch();
        self.right.latch();
        self.jump.latch();
        self.attack.latch();
    }
}

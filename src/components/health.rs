//! Damageable capability.
//!
//! Only entities carrying [`Health`] can be hit by
//! [`apply_damage`](crate::lifecycle::apply_damage).

use bevy_ecs::prelude::Component;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount`, clamping at zero. Returns the health left.
    pub fn take(&mut self, amount: f32) -> f32 {
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.current
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

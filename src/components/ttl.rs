//! Time-to-live component for short-lived entities.
//!
//! The [`Ttl`] component counts down simulation time each tick. When the
//! remaining time reaches zero the entity is removed through
//! [`remove_entity`](crate::lifecycle::remove_entity), so its physics body is
//! detached in the next drain like any other removal.
//!
//! # Related
//!
//! - [`crate::systems::ttl::ttl_system`] – system that updates and expires entities

use bevy_ecs::prelude::Component;

#[derive(Component, Debug, Clone, Copy)]
pub struct Ttl {
    /// Remaining time in seconds before removal.
    pub remaining: f32,
    /// Set once removal has been requested, so it is only requested once.
    pub expired: bool,
}

impl Ttl {
    pub fn new(seconds: f32) -> Self {
        Ttl {
            remaining: seconds,
            expired: false,
        }
    }

    /// Count down by `delta`. Returns `true` exactly once, on expiry.
    pub fn tick(&mut self, delta: f32) -> bool {
        if self.expired {
            return false;
        }
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            self.expired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_expires_once() {
        let mut ttl = Ttl::new(0.5);
        assert!(!ttl.tick(0.25));
        assert!(ttl.tick(0.25));
        assert!(!ttl.tick(0.25));
        assert!(ttl.expired);
    }
}

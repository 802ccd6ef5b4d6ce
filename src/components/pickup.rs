use bevy_ecs::prelude::Component;

/// Collectable item worth `value` points to the player touching it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub value: i64,
}

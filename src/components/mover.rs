use bevy_ecs::prelude::Component;

/// Movement capability for actors that walk (and optionally jump).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Mover {
    /// Horizontal walk speed in world units per second.
    pub speed: f32,
    /// Upward impulse applied on jump. Zero means the actor cannot jump.
    pub jump_impulse: f32,
}

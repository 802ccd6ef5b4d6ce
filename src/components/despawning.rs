use bevy_ecs::prelude::Component;

/// Marker for entities whose detach is queued but has not run yet.
///
/// Lets a second removal (or a hit landing in the same tick) see that the
/// entity is already on its way out.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Despawning;

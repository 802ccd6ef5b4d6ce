use bevy_ecs::prelude::Component;

use crate::resources::physics::BodyHandle;

/// Ownership handle of the physics body backing an entity.
///
/// The body is created and destroyed only inside deferred mutations; see
/// [`crate::lifecycle`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub handle: BodyHandle,
}

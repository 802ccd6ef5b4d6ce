use bevy_ecs::prelude::Component;

/// Horizontal orientation. `flip_x == true` means facing left.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Facing {
    pub flip_x: bool,
}

impl Facing {
    pub fn new(flip_x: bool) -> Self {
        Self { flip_x }
    }

    /// Face along `dx`; zero keeps the current orientation.
    pub fn look_towards(&mut self, dx: f32) {
        if dx < 0.0 {
            self.flip_x = true;
        } else if dx > 0.0 {
            self.flip_x = false;
        }
    }

    /// +1.0 when facing right, -1.0 when facing left.
    pub fn sign(&self) -> f32 {
        if self.flip_x { -1.0 } else { 1.0 }
    }
}

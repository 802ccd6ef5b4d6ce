use bevy_ecs::prelude::Resource;
use fastrand::Rng;

/// Seeded random source for AI decisions.
///
/// Seeded from the session config so two runs with the same inputs make the
/// same choices.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub Rng);

impl SimRng {
    pub fn with_seed(seed: u64) -> Self {
        Self(Rng::with_seed(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

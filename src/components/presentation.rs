use bevy_ecs::prelude::Component;

/// Animation hints for the external renderer.
///
/// Written by actor states on entry and mirrored from `EntityStateChange`
/// packets on replicas. The simulation never reads it back.
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct Presentation {
    pub animation: String,
    pub extra: Option<String>,
}

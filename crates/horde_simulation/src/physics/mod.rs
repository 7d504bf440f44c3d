//! Physics boundary
//!
//! Core не зависит от конкретного физ. движка: только от capability
//! contracts (`SpatialQuery`, `PhysicsBody`, `Damageable`, `AnimationBridge`).
//! `ArenaWorld`: reference provider для headless прогонов и тестов.

pub mod arena;
pub mod capabilities;
pub mod integration;

use bevy::prelude::*;

pub use arena::{ArenaWorld, GroundSpan, Obstacle};
pub use capabilities::*;
pub use integration::integrate_enemy_bodies;

use crate::config::SimulationConfig;
use crate::registry::AgentRegistry;
use crate::schedule::SimClock;
use crate::SimulationSet;

/// Active spatial query provider.
#[derive(Resource)]
pub struct SpatialProvider(pub Box<dyn SpatialQuery + Send + Sync>);

impl SpatialProvider {
    pub fn new(provider: impl SpatialQuery + Send + Sync + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub fn query(&self) -> &dyn SpatialQuery {
        self.0.as_ref()
    }
}

impl Default for SpatialProvider {
    /// Плоский пол на y = 0 (headless default)
    fn default() -> Self {
        Self::new(ArenaWorld::flat(0.0, 100.0))
    }
}

/// Active animation bridge (purely observational).
#[derive(Resource)]
pub struct AnimationSink(pub Box<dyn AnimationBridge + Send + Sync>);

impl Default for AnimationSink {
    fn default() -> Self {
        Self(Box::new(NullAnimationBridge))
    }
}

/// Physics step plugin
///
/// Регистрирует в FixedUpdate:
/// 1. `physics_step` (SimulationSet::Physics): integration + ground snap
/// 2. `sync_spatial_provider` (SimulationSet::Sync): зеркалим тела в provider
pub struct PhysicsStepPlugin;

impl Plugin for PhysicsStepPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialProvider>()
            .init_resource::<AnimationSink>()
            .add_systems(FixedUpdate, physics_step.in_set(SimulationSet::Physics))
            .add_systems(FixedUpdate, sync_spatial_provider.in_set(SimulationSet::Sync));
    }
}

/// System: интегрирует тела врагов на один fixed step.
pub fn physics_step(
    mut registry: ResMut<AgentRegistry>,
    spatial: Res<SpatialProvider>,
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
) {
    integrate_enemy_bodies(&mut registry, spatial.query(), &config.physics, clock.step);
}

/// System: mirror registry bodies into the provider (no-op для engine providers).
pub fn sync_spatial_provider(registry: Res<AgentRegistry>, mut spatial: ResMut<SpatialProvider>) {
    let colliders = registry.colliders();
    spatial.0.sync_agents(&colliders);
}

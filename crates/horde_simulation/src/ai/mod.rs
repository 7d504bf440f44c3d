//! AI decision-making module
//!
//! Enemy Behavior Controller: detection → pursuit → attack commit,
//! separation, knockback, death. Решения чистые (`decide`), побочные
//! эффекты идут через registry / timers в `SimContext`.

use bevy::prelude::*;

pub mod behavior;
pub mod knockback;
pub mod separation;

#[cfg(test)]
mod behavior_tests;

// Re-export основных типов
pub use behavior::{decide, movement_param, run_enemy_behavior, update_enemy, Decision};
pub use knockback::{enter_knockback, tick_knockback};
pub use separation::{apply_separation, separation_force};

use crate::combat::EventOutbox;
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::physics::{AnimationSink, SpatialProvider};
use crate::registry::AgentRegistry;
use crate::schedule::{SimClock, TimerQueue};
use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует `enemy_behavior` в FixedUpdate (SimulationSet::Behavior):
/// после timers/spawning, до combat windows и physics step.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, enemy_behavior.in_set(SimulationSet::Behavior));
    }
}

/// System: один проход state machine по всем врагам.
pub fn enemy_behavior(
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
    spatial: Res<SpatialProvider>,
    mut registry: ResMut<AgentRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut outbox: ResMut<EventOutbox>,
    mut animation: ResMut<AnimationSink>,
) {
    let mut ctx = SimContext {
        registry: &mut *registry,
        timers: &mut *timers,
        outbox: &mut *outbox,
        spatial: spatial.query(),
        config: &*config,
        now: clock.now(),
    };

    run_enemy_behavior(&mut ctx, animation.0.as_mut());
}

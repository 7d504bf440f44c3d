//! Population Spawner
//!
//! - placement: ground-seeking search с retry budget и unchecked fallback
//! - population: live accounting, paced batches, forced fill, respawn loop
//! - difficulty: scale при spawn + явный one-shot rescale

use bevy::prelude::*;

pub mod difficulty;
pub mod placement;
pub mod population;

#[cfg(test)]
mod population_tests;

// Re-export основных типов
pub use difficulty::{rescale_live_enemies, DifficultyScale};
pub use placement::{find_spawn_position, is_spacing_clear, search_spawn_position, Placement};
pub use population::{
    respawn_check, spawn_enemy_at, spawn_forced, spawn_next, start_spawn_batch, SpawnBatch, SpawnerState,
};

use crate::combat::EventOutbox;
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::logger;
use crate::physics::SpatialProvider;
use crate::registry::AgentRegistry;
use crate::schedule::{SimClock, TimerAction, TimerOwner, TimerQueue};
use crate::{DeterministicRng, SimulationSet};

/// External tuning calls into the spawner.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SpawnerCommand {
    /// Forced fill to the population target (no pacing, strict placement)
    FillToTarget,
    /// New difficulty for future spawns + one-shot rescale of live enemies
    SetDifficulty(DifficultyScale),
}

/// Spawner Plugin
///
/// Build: origin из config + первый RespawnCheck на t = 0 (прямо в TimerQueue,
/// без Startup schedule → ручной `run_schedule(FixedUpdate)` в тестах детерминирован).
/// FixedUpdate (SimulationSet::Spawning): `apply_spawner_commands`.
/// Paced spawns / respawn checks идут через timers.
pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        let origin = app
            .world()
            .get_resource::<SimulationConfig>()
            .map(|config| config.spawner.origin())
            .unwrap_or_default();

        app.add_event::<SpawnerCommand>()
            .insert_resource(SpawnerState::new(origin))
            .add_systems(FixedUpdate, apply_spawner_commands.in_set(SimulationSet::Spawning));

        let mut timers = app.world_mut().get_resource_or_insert_with(TimerQueue::default);
        arm_respawn_loop(&mut timers, 0.0);
    }
}

/// Schedules the first RespawnCheck unless one is already pending.
pub fn arm_respawn_loop(timers: &mut TimerQueue, now: f32) {
    if !timers.has_pending(TimerOwner::Spawner, TimerAction::RespawnCheck) {
        timers.schedule(TimerOwner::Spawner, now, TimerAction::RespawnCheck);
    }
}

/// System: forced fill / difficulty changes requested by the host.
#[allow(clippy::too_many_arguments)]
pub fn apply_spawner_commands(
    mut commands: EventReader<SpawnerCommand>,
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
    spatial: Res<SpatialProvider>,
    mut registry: ResMut<AgentRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut outbox: ResMut<EventOutbox>,
    mut spawner: ResMut<SpawnerState>,
    mut rng: ResMut<DeterministicRng>,
) {
    if commands.is_empty() {
        return;
    }

    let mut ctx = SimContext {
        registry: &mut *registry,
        timers: &mut *timers,
        outbox: &mut *outbox,
        spatial: spatial.query(),
        config: &*config,
        now: clock.now(),
    };

    for command in commands.read() {
        match *command {
            SpawnerCommand::FillToTarget => {
                spawn_forced(&mut ctx, &mut spawner, &mut rng);
            }
            SpawnerCommand::SetDifficulty(scale) => {
                let scale = scale.sanitized();
                spawner.difficulty = scale;
                let rescaled = rescale_live_enemies(ctx.registry, &ctx.config.enemy.base_stats(), &scale);
                logger::log_info(&format!("📈 Difficulty set to {:?}, rescaled {} live enemies", scale, rescaled));
            }
        }
    }
}

//! Scheduling: fixed-tick clock + deadline timers
//!
//! Все "ожидания" (attack delay, death fade, spawn pacing, immunity)
//! живут здесь как timers; `fire_due_timers` раз в tick снимает
//! наступившие и диспатчит их в combat / spawner.

pub mod clock;
pub mod timers;

use bevy::prelude::*;

pub use clock::{advance_clock, SimClock};
pub use timers::{ScheduledTimer, TimerAction, TimerHandle, TimerOwner, TimerQueue};

use crate::combat::{self, AttackWindows, EventOutbox};
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::physics::SpatialProvider;
use crate::registry::AgentRegistry;
use crate::spawner::{self, SpawnerState};
use crate::DeterministicRng;

/// System: fires every due timer (включая те, что поставлены в этом же проходе
/// с deadline ≤ now).
#[allow(clippy::too_many_arguments)]
pub fn fire_due_timers(
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
    spatial: Res<SpatialProvider>,
    mut registry: ResMut<AgentRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut outbox: ResMut<EventOutbox>,
    mut windows: ResMut<AttackWindows>,
    mut spawner: ResMut<SpawnerState>,
    mut rng: ResMut<DeterministicRng>,
) {
    let now = clock.now();
    let mut ctx = SimContext {
        registry: &mut *registry,
        timers: &mut *timers,
        outbox: &mut *outbox,
        spatial: spatial.query(),
        config: &*config,
        now,
    };

    while let Some(timer) = ctx.timers.pop_due(now) {
        dispatch(&mut ctx, &mut *windows, &mut *spawner, &mut *rng, timer.action);
    }
}

/// Routes one fired timer action to its handler.
pub fn dispatch(
    ctx: &mut SimContext,
    windows: &mut AttackWindows,
    spawner: &mut SpawnerState,
    rng: &mut DeterministicRng,
    action: TimerAction,
) {
    match action {
        TimerAction::ResolveEnemyAttack { enemy, commit } => combat::resolve_enemy_attack(ctx, enemy, commit),
        TimerAction::ClearEnemyAttack { enemy, commit } => combat::clear_enemy_attack(ctx.registry, enemy, commit),
        TimerAction::DespawnEnemy(enemy) => combat::despawn_enemy(ctx, spawner, enemy),
        TimerAction::CloseAttackWindow { owner, commit } => windows.close(owner, commit),
        TimerAction::ClearPlayerAttack(player) => combat::clear_player_attack(ctx.registry, player),
        TimerAction::ClearPlayerImmunity(player) => combat::clear_player_immunity(ctx.registry, player),
        TimerAction::SpawnNext => spawner::spawn_next(ctx, spawner, rng),
        TimerAction::RespawnCheck => spawner::respawn_check(ctx, spawner),
    }
}

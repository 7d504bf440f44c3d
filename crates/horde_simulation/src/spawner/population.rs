//! Population accounting, paced spawn batches, forced fill, respawn loop.
//!
//! Spawner не владеет временем жизни врагов: `live`: слабые ссылки (ids)
//! в registry, чистятся при despawn (`forget`) и при каждом respawn check.

use bevy::prelude::*;

use super::difficulty::DifficultyScale;
use super::placement::{find_spawn_position, search_spawn_position};
use crate::combat::EnemySpawned;
use crate::components::AgentId;
use crate::context::SimContext;
use crate::logger;
use crate::registry::AgentRegistry;
use crate::schedule::{TimerAction, TimerOwner};
use crate::DeterministicRng;

/// Spawn batch in progress ("spawn in progress" flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnBatch {
    pub remaining: usize,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct SpawnerState {
    pub origin: Vec2,
    /// Ids this spawner created, spawn order
    live: Vec<AgentId>,
    batch: Option<SpawnBatch>,
    pub difficulty: DifficultyScale,
}

impl SpawnerState {
    pub fn new(origin: Vec2) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// Tracked enemies that are still registered and not Dead.
    pub fn live_count(&self, registry: &AgentRegistry) -> usize {
        self.live
            .iter()
            .filter(|id| registry.enemy(**id).is_some_and(|e| !e.is_dead()))
            .count()
    }

    /// Drops ids that are no longer live (stale or dead).
    pub fn prune(&mut self, registry: &AgentRegistry) {
        self.live.retain(|id| registry.enemy(*id).is_some_and(|e| !e.is_dead()));
    }

    pub fn track(&mut self, id: AgentId) {
        if !self.live.contains(&id) {
            self.live.push(id);
        }
    }

    pub fn forget(&mut self, id: AgentId) {
        self.live.retain(|tracked| *tracked != id);
    }

    pub fn tracked(&self) -> &[AgentId] {
        &self.live
    }

    pub fn is_spawning(&self) -> bool {
        self.batch.is_some()
    }

    pub fn batch(&self) -> Option<SpawnBatch> {
        self.batch
    }
}

/// Periodic check: spawn the deficit (paced) if no batch is running, then re-arm.
pub fn respawn_check(ctx: &mut SimContext, spawner: &mut SpawnerState) {
    spawner.prune(ctx.registry);

    let target = ctx.config.spawner.target_count;
    let live = spawner.live_count(ctx.registry);
    if live < target && !spawner.is_spawning() {
        let deficit = target - live;
        logger::log(&format!("Respawn check: {}/{} live, spawning {}", live, target, deficit));
        start_spawn_batch(ctx, spawner, deficit);
    }

    ctx.timers.schedule(
        TimerOwner::Spawner,
        ctx.now + ctx.config.spawner.respawn_interval,
        TimerAction::RespawnCheck,
    );
}

/// Starts a paced batch: first placement right away, then one per `time_between_spawns`.
///
/// Returns false if a batch is already in progress or `count` is 0.
pub fn start_spawn_batch(ctx: &mut SimContext, spawner: &mut SpawnerState, count: usize) -> bool {
    if count == 0 || spawner.is_spawning() {
        return false;
    }

    spawner.batch = Some(SpawnBatch { remaining: count });
    ctx.timers.schedule(TimerOwner::Spawner, ctx.now, TimerAction::SpawnNext);
    true
}

/// Timer: one paced placement of the current batch.
pub fn spawn_next(ctx: &mut SimContext, spawner: &mut SpawnerState, rng: &mut DeterministicRng) {
    let Some(batch) = spawner.batch else {
        return;
    };

    // Forced fill мог закрыть дефицит раньше батча
    if spawner.live_count(ctx.registry) >= ctx.config.spawner.target_count {
        spawner.batch = None;
        return;
    }

    let placement = find_spawn_position(spawner.origin, ctx.registry, ctx.spatial, &ctx.config.spawner, rng);
    spawn_enemy_at(ctx, spawner, placement.position, placement.fallback);

    let remaining = batch.remaining.saturating_sub(1);
    if remaining == 0 {
        spawner.batch = None;
        return;
    }

    spawner.batch = Some(SpawnBatch { remaining });
    ctx.timers.schedule(
        TimerOwner::Spawner,
        ctx.now + ctx.config.spawner.time_between_spawns,
        TimerAction::SpawnNext,
    );
}

/// Forced fill up to the population target with no inter-spawn delay.
///
/// Strict search only (no fallback); every search counts against the
/// `forced_budget_factor × deficit` budget. Returns how many were spawned.
pub fn spawn_forced(ctx: &mut SimContext, spawner: &mut SpawnerState, rng: &mut DeterministicRng) -> usize {
    spawner.prune(ctx.registry);

    let target = ctx.config.spawner.target_count;
    let deficit = target.saturating_sub(spawner.live_count(ctx.registry));
    let budget = deficit * ctx.config.spawner.forced_budget_factor as usize;

    let mut spawned = 0;
    let mut searches = 0;
    while spawned < deficit && searches < budget {
        searches += 1;
        let (position, _) = search_spawn_position(spawner.origin, ctx.registry, ctx.spatial, &ctx.config.spawner, rng);
        if let Some(position) = position {
            spawn_enemy_at(ctx, spawner, position, false);
            spawned += 1;
        }
    }

    if spawned < deficit {
        logger::log_warning(&format!(
            "⚠️ Forced spawn reached {}/{} after {} searches (budget exhausted)",
            spawned, deficit, searches
        ));
    }

    spawned
}

/// Registers one enemy with the current difficulty-scaled stats.
pub fn spawn_enemy_at(ctx: &mut SimContext, spawner: &mut SpawnerState, position: Vec2, fallback: bool) -> AgentId {
    let stats = spawner.difficulty.apply(&ctx.config.enemy.base_stats());
    let id = ctx.registry.spawn_enemy(position, stats);
    spawner.track(id);

    ctx.outbox.spawned.push(EnemySpawned { id, position, fallback });
    logger::log_info(&format!("🧟 Spawned enemy {} at ({:.2}, {:.2})", id, position.x, position.y));
    id
}

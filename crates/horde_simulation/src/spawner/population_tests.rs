//! Population accounting: respawn checks, paced batches, spacing, forced fill.

use bevy::prelude::*;

use super::*;
use crate::combat::{despawn_enemy, mark_enemy_dead, EnemySpawned};
use crate::components::AgentId;
use crate::context::test_support::TestWorld;
use crate::schedule::{TimerAction, TimerOwner};

/// Tracked live enemies parked outside the spawn ring (x = 20, 23, ...).
fn populate(world: &mut TestWorld, count: usize) -> Vec<AgentId> {
    (0..count)
        .map(|i| {
            let position = Vec2::new(20.0 + 3.0 * i as f32, 0.5);
            world.with_spawner(|ctx, spawner, _| spawn_enemy_at(ctx, spawner, position, false))
        })
        .collect()
}

fn check(world: &mut TestWorld) {
    world.with_spawner(|ctx, spawner, _| respawn_check(ctx, spawner));
}

fn spawned_since(world: &TestWorld, skip: usize) -> Vec<EnemySpawned> {
    world.outbox.spawned.iter().skip(skip).copied().collect()
}

#[test]
fn test_full_population_spawns_nothing() {
    let mut world = TestWorld::new();
    populate(&mut world, 10);

    check(&mut world);
    world.advance_to(2.0);

    assert!(!world.spawner.is_spawning());
    assert_eq!(world.registry.enemy_count(), 10);
    assert_eq!(world.outbox.spawned.len(), 10);
    // Следующая проверка через respawn_interval
    let next: Vec<f32> = world
        .timers
        .pending_for(TimerOwner::Spawner)
        .filter(|t| t.action == TimerAction::RespawnCheck)
        .map(|t| t.deadline)
        .collect();
    assert_eq!(next, vec![5.0]);
}

#[test]
fn test_deficit_spawns_paced_batch() {
    let mut world = TestWorld::new();
    populate(&mut world, 6);

    check(&mut world);
    assert_eq!(world.spawner.batch(), Some(SpawnBatch { remaining: 4 }));

    world.advance_to(0.0);
    assert_eq!(spawned_since(&world, 6).len(), 1);

    world.advance_to(0.49);
    assert_eq!(spawned_since(&world, 6).len(), 1);

    world.advance_to(0.5);
    assert_eq!(spawned_since(&world, 6).len(), 2);

    world.advance_to(1.0);
    assert_eq!(spawned_since(&world, 6).len(), 3);

    world.advance_to(1.5);
    assert_eq!(spawned_since(&world, 6).len(), 4);
    assert!(!world.spawner.is_spawning());

    // Батч исчерпан: больше SpawnNext не стоит
    world.advance_to(4.9);
    assert_eq!(spawned_since(&world, 6).len(), 4);
    assert_eq!(world.spawner.live_count(&world.registry), 10);
}

#[test]
fn test_batch_placements_keep_spacing() {
    let mut world = TestWorld::new();
    world.rng = crate::DeterministicRng::new(99);
    populate(&mut world, 7);

    check(&mut world);
    world.advance_to(1.0);

    let batch = spawned_since(&world, 7);
    assert_eq!(batch.len(), 3);
    for (i, earlier) in batch.iter().enumerate() {
        assert!(earlier.fallback || earlier.position.y > 0.0);
        for later in batch.iter().skip(i + 1) {
            // Поздний spawn проверялся против раннего, если не fallback
            assert!(later.fallback || earlier.position.distance(later.position) >= 2.0);
        }
    }
}

#[test]
fn test_running_batch_blocks_new_batch() {
    let mut world = TestWorld::new();

    check(&mut world);
    assert_eq!(world.spawner.batch(), Some(SpawnBatch { remaining: 10 }));
    assert!(!world.with_spawner(|ctx, spawner, _| start_spawn_batch(ctx, spawner, 3)));

    // Повторная проверка во время батча: только re-arm
    world.now = 0.1;
    check(&mut world);
    assert_eq!(world.spawner.batch(), Some(SpawnBatch { remaining: 10 }));
}

#[test]
fn test_deaths_reopen_deficit() {
    let mut world = TestWorld::new();
    let ids = populate(&mut world, 10);

    for id in &ids[..2] {
        world.registry.apply_damage(*id, 1000);
        mark_enemy_dead(&mut world.ctx(), *id, None);
    }
    assert_eq!(world.spawner.live_count(&world.registry), 8);

    check(&mut world);
    assert_eq!(world.spawner.batch(), Some(SpawnBatch { remaining: 2 }));
    assert!(!world.spawner.tracked().contains(&ids[0]));
}

#[test]
fn test_despawn_forgets_enemy() {
    let mut world = TestWorld::new();
    let ids = populate(&mut world, 3);

    world.with_spawner(|ctx, spawner, _| despawn_enemy(ctx, spawner, ids[1]));

    assert_eq!(world.spawner.tracked(), &[ids[0], ids[2]]);
    assert!(!world.registry.contains(ids[1]));
}

#[test]
fn test_forced_fill_reaches_target_in_open_arena() {
    let mut world = TestWorld::new();
    world.config.spawner.target_count = 5;
    world.config.spawner.spawn_radius = 40.0;

    let spawned = world.with_spawner(|ctx, spawner, rng| spawn_forced(ctx, spawner, rng));

    assert_eq!(spawned, 5);
    assert_eq!(world.registry.enemy_count(), 5);
    assert!(world.outbox.spawned.iter().all(|s| !s.fallback));
    assert!(!world.spawner.is_spawning());
}

#[test]
fn test_forced_fill_stops_at_budget_without_fallback() {
    let mut world = TestWorld::new();

    // Кандидаты ложатся в x ∈ [-8, 8]: с шагом 2 туда влезает максимум 9 врагов из 10
    let spawned = world.with_spawner(|ctx, spawner, rng| spawn_forced(ctx, spawner, rng));

    assert!((1..=9).contains(&spawned));
    assert_eq!(world.registry.enemy_count(), spawned);
    let positions: Vec<Vec2> = world.outbox.spawned.iter().map(|s| s.position).collect();
    assert!(world.outbox.spawned.iter().all(|s| !s.fallback));
    for (i, a) in positions.iter().enumerate() {
        for b in positions.iter().skip(i + 1) {
            assert!(a.distance(*b) >= 2.0);
        }
    }
}

#[test]
fn test_forced_fill_with_full_population_is_noop() {
    let mut world = TestWorld::new();
    populate(&mut world, 10);

    let spawned = world.with_spawner(|ctx, spawner, rng| spawn_forced(ctx, spawner, rng));

    assert_eq!(spawned, 0);
    assert_eq!(world.registry.enemy_count(), 10);
}

#[test]
fn test_difficulty_applies_to_new_spawns_only() {
    let mut world = TestWorld::new();
    let veteran = populate(&mut world, 1)[0];

    world.spawner.difficulty = DifficultyScale {
        health: 2.0,
        speed: 1.0,
        damage: 1.5,
    };
    let recruit = populate(&mut world, 2)[1];

    assert_eq!(world.registry.enemy(veteran).map(|e| e.health.max), Some(30));
    let stats = world.registry.enemy(recruit).map(|e| e.stats).expect("registered");
    assert_eq!(stats.max_health, 60);
    assert_eq!(stats.damage, 30);
}

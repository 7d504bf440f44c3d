//! Enemy state machine: transitions, commit persistence, knockback, death.

use bevy::prelude::*;

use super::*;
use crate::components::{AgentId, EnemyState, Facing};
use crate::context::test_support::TestWorld;
use crate::physics::AnimationBridge;
use crate::schedule::{TimerAction, TimerOwner};

fn tick(world: &mut TestWorld, id: AgentId) {
    let target = world.registry.live_player().map(|p| p.position);
    update_enemy(&mut world.ctx(), id, target);
}

fn state(world: &TestWorld, id: AgentId) -> EnemyState {
    world.registry.enemy(id).map(|e| e.state).unwrap_or(EnemyState::Dead)
}

fn move_player(world: &mut TestWorld, x: f32) {
    if let Some(player) = world.registry.player_mut() {
        player.position.x = x;
    }
}

#[test]
fn test_idle_without_player() {
    let mut world = TestWorld::new();
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));

    tick(&mut world, enemy);

    assert_eq!(state(&world, enemy), EnemyState::Idle);
    assert_eq!(world.registry.enemy(enemy).map(|e| e.velocity.x), Some(0.0));
}

#[test]
fn test_idle_beyond_detection_radius() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(10.0, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));

    tick(&mut world, enemy);

    assert_eq!(state(&world, enemy), EnemyState::Idle);
}

#[test]
fn test_pursuit_moves_toward_player_and_faces_it() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(-4.0, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));

    tick(&mut world, enemy);

    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Pursuing);
    assert!((e.velocity.x + 2.5).abs() < 1e-5);
    assert_eq!(e.facing, Facing::Left);
    assert!((movement_param(e) - 1.0).abs() < 1e-5);
}

#[test]
fn test_attack_commit_in_range_schedules_resolve_and_clear() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.8, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    world.now = 1.0;

    tick(&mut world, enemy);

    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Attacking);
    assert!(e.is_attacking());
    assert_eq!(e.last_attack_time, Some(1.0));
    assert_eq!(e.velocity.x, 0.0);

    let mut deadlines: Vec<(f32, TimerAction)> = world
        .timers
        .pending_for(TimerOwner::Agent(enemy))
        .map(|t| (t.deadline, t.action))
        .collect();
    deadlines.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert_eq!(deadlines.len(), 2);
    assert!((deadlines[0].0 - 1.2).abs() < 1e-5);
    assert_eq!(deadlines[0].1, TimerAction::ResolveEnemyAttack { enemy, commit: 0 });
    assert!((deadlines[1].0 - 2.0).abs() < 1e-5);
    assert_eq!(deadlines[1].1, TimerAction::ClearEnemyAttack { enemy, commit: 0 });
}

#[test]
fn test_commit_survives_player_leaving() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.8, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));

    tick(&mut world, enemy);
    assert!(world.registry.enemy(enemy).is_some_and(|e| e.is_attacking()));

    // Игрок отошёл, но ещё в detection radius → враг стоит в Attacking
    move_player(&mut world, 3.0);
    world.now = 0.1;
    tick(&mut world, enemy);
    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Attacking);
    assert_eq!(e.velocity.x, 0.0);

    // Вне detection → Idle, но commit и его timers живы
    move_player(&mut world, 20.0);
    tick(&mut world, enemy);
    assert_eq!(state(&world, enemy), EnemyState::Idle);
    assert!(world.registry.enemy(enemy).is_some_and(|e| e.is_attacking()));
    assert_eq!(world.timers.pending_for(TimerOwner::Agent(enemy)).count(), 2);
}

#[test]
fn test_cooldown_blocks_second_commit() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.8, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));

    tick(&mut world, enemy);
    world.advance_to(1.0);
    assert!(world.registry.enemy(enemy).is_some_and(|e| !e.is_attacking()));

    // Cooldown 2 s ещё идёт: в радиусе атаки, но дальше stop distance → подходим
    tick(&mut world, enemy);
    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Pursuing);
    assert_eq!(e.attack_commits, 1);

    world.advance_to(2.5);
    tick(&mut world, enemy);
    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Attacking);
    assert_eq!(e.attack_commits, 2);
}

#[test]
fn test_stopped_inside_stop_distance() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.2, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    if let Some(e) = world.registry.enemy_mut(enemy) {
        e.last_attack_time = Some(0.0);
    }
    world.now = 0.5;

    tick(&mut world, enemy);

    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Pursuing);
    assert_eq!(e.velocity.x, 0.0);
    assert_eq!(movement_param(e), 0.0);
}

#[test]
fn test_knockback_suppresses_decisions() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.8, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    let combat = world.config.combat.clone();
    enter_knockback(&mut world.registry, enemy, -1.0, &combat, 0.0);

    world.now = 0.3;
    tick(&mut world, enemy);
    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Knockback);
    assert!(!e.is_attacking());

    // Выход из knockback занимает один tick, решение: со следующего
    world.now = 0.5;
    tick(&mut world, enemy);
    assert_eq!(state(&world, enemy), EnemyState::Idle);

    world.now = 0.52;
    tick(&mut world, enemy);
    assert_eq!(state(&world, enemy), EnemyState::Attacking);
}

#[test]
fn test_external_death_gets_death_fade() {
    let mut world = TestWorld::new();
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    world.registry.apply_damage(enemy, 1000);
    world.now = 3.0;

    tick(&mut world, enemy);

    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Dead);
    assert_eq!(e.died_at, Some(3.0));
    assert_eq!(movement_param(e), 0.0);
    assert!(world
        .timers
        .has_pending(TimerOwner::Agent(enemy), TimerAction::DespawnEnemy(enemy)));
    assert_eq!(world.outbox.died.len(), 1);

    // Повторный tick не дублирует смерть
    tick(&mut world, enemy);
    assert_eq!(world.outbox.died.len(), 1);
    assert_eq!(world.timers.len(), 1);
}

#[derive(Default)]
struct RecordingBridge {
    params: Vec<(AgentId, f32)>,
}

impl AnimationBridge for RecordingBridge {
    fn set_movement_param(&mut self, id: AgentId, value: f32) {
        self.params.push((id, value));
    }
}

#[test]
fn test_behavior_pass_publishes_movement_params() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(0.0, 0.5));
    let near = world.spawn_enemy(Vec2::new(4.0, 0.5));
    let far = world.spawn_enemy(Vec2::new(30.0, 0.5));
    world.sync();

    let mut bridge = RecordingBridge::default();
    run_enemy_behavior(&mut world.ctx(), &mut bridge);

    assert_eq!(bridge.params.len(), 2);
    assert_eq!(bridge.params[0].0, near);
    assert!((bridge.params[0].1 - 1.0).abs() < 1e-5);
    assert_eq!(bridge.params[1], (far, 0.0));
}

#[test]
fn test_separation_feeds_pending_force() {
    let mut world = TestWorld::new();
    let left = world.spawn_enemy(Vec2::new(0.0, 0.5));
    let right = world.spawn_enemy(Vec2::new(0.5, 0.5));
    world.sync();

    tick(&mut world, left);
    tick(&mut world, right);

    let left_force = world.registry.enemy(left).map(|e| e.pending_force).unwrap_or_default();
    let right_force = world.registry.enemy(right).map(|e| e.pending_force).unwrap_or_default();
    assert!(left_force.x < 0.0);
    assert!(right_force.x > 0.0);
    assert!((left_force.x + right_force.x).abs() < 1e-5);
}

#[test]
fn test_turns_to_player_behind_and_hits() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(-0.2, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    assert_eq!(world.registry.enemy(enemy).map(|e| e.facing), Some(Facing::Right));

    tick(&mut world, enemy);
    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Attacking);
    assert_eq!(e.facing, Facing::Left);

    world.advance_to(0.3);
    assert_eq!(world.registry.player().map(|p| p.health.current), Some(80));
}

#[test]
fn test_stopped_enemy_turns_to_player_behind() {
    let mut world = TestWorld::new();
    world.spawn_player(Vec2::new(-0.2, 0.5));
    let enemy = world.spawn_enemy(Vec2::new(0.0, 0.5));
    if let Some(e) = world.registry.enemy_mut(enemy) {
        e.last_attack_time = Some(0.0);
    }
    world.now = 0.5;

    tick(&mut world, enemy);

    let e = world.registry.enemy(enemy).expect("registered");
    assert_eq!(e.state, EnemyState::Pursuing);
    assert_eq!(e.velocity.x, 0.0);
    assert_eq!(e.facing, Facing::Left);
}

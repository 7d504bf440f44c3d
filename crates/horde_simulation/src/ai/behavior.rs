//! Enemy Behavior Controller: per-enemy state machine.
//!
//! Порядок приоритетов за один tick:
//! 1. Dead (или health ≤ 0) → только death-fade timer
//! 2. Knockback → подавляет всё до `knockback_until`, затем damping + Idle
//! 3. Separation (всегда, кроме Knockback)
//! 4. Нет игрока / вне detection radius → Idle, vx = 0
//! 5. Атака в полёте → Attacking, vx = 0 (commit не отменяется)
//! 6. distance ≤ attack_range и cooldown истёк → Attacking + commit
//! 7. distance > stop_distance → Pursuing, vx = dir.x × speed
//! 8. иначе → Pursuing "stopped", vx = 0
//!
//! В 6-8 враг разворачивается к игроку.

use bevy::prelude::*;

use super::knockback::tick_knockback;
use super::separation::apply_separation;
use crate::combat;
use crate::components::{AgentId, Enemy, EnemyState, Facing};
use crate::context::SimContext;
use crate::physics::{AnimationBridge, PhysicsBody};

/// One behavior pass over every registered enemy (id order).
pub fn run_enemy_behavior(ctx: &mut SimContext, animation: &mut dyn AnimationBridge) {
    let target = ctx.registry.live_player().map(|p| p.position);

    for id in ctx.registry.enemy_ids() {
        update_enemy(ctx, id, target);

        if let Some(enemy) = ctx.registry.enemy(id) {
            animation.set_movement_param(id, movement_param(enemy));
        }
    }
}

/// Evaluates one enemy against the (optional) player position.
pub fn update_enemy(ctx: &mut SimContext, id: AgentId, target: Option<Vec2>) {
    let Some(enemy) = ctx.registry.enemy(id) else {
        return;
    };

    if enemy.is_dead() || !enemy.health.is_alive() {
        // Смерть, не прошедшая через combat (прямой apply_damage, rescale):
        // доводим до Dead и ставим death-fade
        if enemy.died_at.is_none() {
            combat::mark_enemy_dead(ctx, id, None);
        }
        return;
    }

    if tick_knockback(ctx.registry, id, &ctx.config.combat, ctx.now) {
        return;
    }

    apply_separation(ctx.registry, ctx.spatial, &ctx.config.enemy, id);

    let Some(decision) = ctx.registry.enemy(id).map(|enemy| decide(enemy, target, ctx.now)) else {
        return;
    };

    if let Some(enemy) = ctx.registry.enemy_mut(id) {
        enemy.state = decision.state;
        if let Some(facing) = decision.facing {
            enemy.facing = facing;
        }
        let vy = enemy.velocity.y;
        ctx.registry.set_velocity(id, Vec2::new(decision.horizontal_velocity, vy));
    }

    if decision.commit_attack {
        combat::commit_enemy_attack(ctx, id);
    }
}

/// Result of one state evaluation (pure, no side effects).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub state: EnemyState,
    pub horizontal_velocity: f32,
    pub facing: Option<Facing>,
    pub commit_attack: bool,
}

impl Decision {
    fn hold(state: EnemyState) -> Self {
        Self {
            state,
            horizontal_velocity: 0.0,
            facing: None,
            commit_attack: false,
        }
    }
}

/// Transition rules for a live enemy that is not in knockback.
pub fn decide(enemy: &Enemy, target: Option<Vec2>, now: f32) -> Decision {
    let Some(target) = target else {
        return Decision::hold(EnemyState::Idle);
    };

    let distance = enemy.distance_to(target);
    if distance > enemy.stats.detection_radius {
        return Decision::hold(EnemyState::Idle);
    }

    if enemy.is_attacking() {
        return Decision::hold(EnemyState::Attacking);
    }

    // Разворот к игроку и перед commit'ом, и стоя: иначе игрок за спиной неуязвим
    let facing = Facing::from_delta_x(target.x - enemy.position.x);

    if distance <= enemy.stats.attack_range && enemy.cooldown_elapsed(now) {
        return Decision {
            facing,
            commit_attack: true,
            ..Decision::hold(EnemyState::Attacking)
        };
    }

    if distance > enemy.stats.stop_distance {
        let direction = (target - enemy.position).normalize_or_zero();
        return Decision {
            state: EnemyState::Pursuing,
            horizontal_velocity: direction.x * enemy.stats.move_speed,
            facing,
            commit_attack: false,
        };
    }

    // Stopped: внутри stop distance, cooldown ещё идёт
    Decision {
        facing,
        ..Decision::hold(EnemyState::Pursuing)
    }
}

/// Animation parameter: |vx| / move_speed (0 для мёртвых).
pub fn movement_param(enemy: &Enemy) -> f32 {
    if enemy.is_dead() || enemy.stats.move_speed <= 0.0 {
        return 0.0;
    }
    enemy.velocity.x.abs() / enemy.stats.move_speed
}

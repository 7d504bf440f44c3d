//! Knockback: forced, AI-suppressing displacement after a hit.

use bevy::prelude::*;

use crate::components::{AgentId, EnemyState};
use crate::config::CombatConfig;
use crate::physics::PhysicsBody;
use crate::registry::AgentRegistry;

/// Переводит врага в Knockback из любого живого состояния.
///
/// `direction`: знак горизонтального толчка (от источника урона).
/// Returns false for stale or dead ids.
pub fn enter_knockback(
    registry: &mut AgentRegistry,
    id: AgentId,
    direction: f32,
    config: &CombatConfig,
    now: f32,
) -> bool {
    let Some(enemy) = registry.enemy_mut(id) else {
        return false;
    };
    if enemy.is_dead() {
        return false;
    }

    enemy.state = EnemyState::Knockback;
    enemy.knockback_until = now + config.knockback_duration;

    let push = if direction < 0.0 { -1.0 } else { 1.0 };
    registry.apply_impulse(id, Vec2::new(push * config.knockback_force, 0.0));
    true
}

/// Knockback tick. Returns true while knockback consumed this tick
/// (still active, or just ended: velocity damped, state → Idle).
pub fn tick_knockback(registry: &mut AgentRegistry, id: AgentId, config: &CombatConfig, now: f32) -> bool {
    let Some(enemy) = registry.enemy_mut(id) else {
        return false;
    };
    if enemy.state != EnemyState::Knockback {
        return false;
    }

    if now < enemy.knockback_until {
        return true;
    }

    // Выход: гасим скорость, re-evaluation со следующего tick'а
    enemy.velocity *= config.knockback_exit_damping;
    enemy.state = EnemyState::Idle;
    true
}

//! Body integration step (enemies only; player body принадлежит хосту)
//!
//! Порядок на одно тело:
//! 1. velocity += pending impulse (мгновенный Δv, mass = 1)
//! 2. velocity += pending force × dt (separation)
//! 3. velocity.y += gravity × dt
//! 4. position += velocity × dt
//! 5. ground snap: raycast вниз по `MASK_GROUND`, не даём провалиться сквозь пол

use bevy::prelude::*;

use super::capabilities::{SpatialQuery, MASK_GROUND};
use crate::components::Enemy;
use crate::config::PhysicsConfig;
use crate::registry::AgentRegistry;

/// Integrates every non-dead enemy body by `dt`.
pub fn integrate_enemy_bodies(
    registry: &mut AgentRegistry,
    spatial: &dyn SpatialQuery,
    config: &PhysicsConfig,
    dt: f32,
) {
    for enemy in registry.enemies_mut() {
        if enemy.is_dead() {
            continue;
        }
        integrate_body(enemy, spatial, config, dt);
    }
}

fn integrate_body(enemy: &mut Enemy, spatial: &dyn SpatialQuery, config: &PhysicsConfig, dt: f32) {
    enemy.velocity += enemy.pending_impulse;
    enemy.velocity += enemy.pending_force * dt;
    enemy.pending_impulse = Vec2::ZERO;
    enemy.pending_force = Vec2::ZERO;

    enemy.velocity.y += config.gravity * dt;

    let previous = enemy.position;
    enemy.position += enemy.velocity * dt;

    if enemy.velocity.y > 0.0 {
        return; // летит вверх: не прилипаем к полу
    }

    // Луч от max(старой, новой) высоты: быстрое падение не проскакивает пол
    let top = previous.y.max(enemy.position.y) + config.ground_probe;
    let origin = Vec2::new(enemy.position.x, top);
    let reach = top - enemy.position.y + config.ground_clearance;

    if let Some(hit) = spatial.raycast(origin, Vec2::NEG_Y, reach, MASK_GROUND) {
        let rest_y = hit.point.y + config.ground_clearance;
        if enemy.position.y <= rest_y {
            enemy.position.y = rest_y;
            enemy.velocity.y = 0.0;
        }
    }
}

//! Separation: distance-weighted repulsion between nearby enemies.
//!
//! force = strength / max(distance, 0.1), направлена от соседа, суммируется.
//! Складывается в `pending_force` того же тела, что и движение FSM.

use bevy::prelude::*;

use crate::components::AgentId;
use crate::config::EnemyConfig;
use crate::physics::{SpatialQuery, LAYER_ENEMY};
use crate::registry::AgentRegistry;

const MIN_SEPARATION_DISTANCE: f32 = 0.1;

/// Repulsion on `id` from its neighbors (stale / dead ids skipped).
pub fn separation_force(
    registry: &AgentRegistry,
    spatial: &dyn SpatialQuery,
    config: &EnemyConfig,
    id: AgentId,
) -> Vec2 {
    let Some(enemy) = registry.enemy(id) else {
        return Vec2::ZERO;
    };

    let mut force = Vec2::ZERO;
    for other_id in spatial.overlap_circle(enemy.position, config.separation_radius, LAYER_ENEMY) {
        if other_id == id {
            continue;
        }
        // Stale id (despawned после sync) или труп → "no match"
        let Some(other) = registry.enemy(other_id).filter(|o| !o.is_dead()) else {
            continue;
        };

        let away = enemy.position - other.position;
        let distance = away.length();
        let direction = away.try_normalize().unwrap_or_else(|| tie_break(id, other_id));

        force += direction * (config.separation_strength / distance.max(MIN_SEPARATION_DISTANCE));
    }

    force
}

/// Accumulates the separation force into the body for the next physics step.
pub fn apply_separation(
    registry: &mut AgentRegistry,
    spatial: &dyn SpatialQuery,
    config: &EnemyConfig,
    id: AgentId,
) {
    let force = separation_force(registry, spatial, config, id);
    if let Some(enemy) = registry.enemy_mut(id) {
        enemy.pending_force += force;
    }
}

/// Совпавшие позиции: расталкиваем по x детерминированно (по id).
fn tie_break(id: AgentId, other: AgentId) -> Vec2 {
    if id > other {
        Vec2::X
    } else {
        Vec2::NEG_X
    }
}

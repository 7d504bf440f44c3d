//! Placement search: ground-seeking, spacing-checked, bounded retries.
//!
//! Одна попытка:
//! 1. random angle ∈ [0, 2π), radius ∈ [min_spawn_radius, spawn_radius]
//! 2. candidate x = origin.x + radius·cos(angle) (вертикаль на этом шаге игнорируется)
//! 3. raycast вниз с `raycast_height` над origin по `MASK_GROUND`;
//!    hit → y = hit.y + ground_offset, промах → кандидат отклонён
//! 4. живой враг ближе `min_spacing` → кандидат отклонён

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

use crate::config::SpawnerConfig;
use crate::logger;
use crate::physics::{SpatialQuery, MASK_GROUND};
use crate::registry::AgentRegistry;
use crate::DeterministicRng;

/// Where an enemy will be placed and how the search went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub attempts: u32,
    /// Retry budget exhausted; spacing NOT validated
    pub fallback: bool,
}

/// Strict search: `Some` only for a ground-snapped, spacing-valid position.
///
/// Returns the position (if any) and the number of attempts spent.
pub fn search_spawn_position(
    origin: Vec2,
    registry: &AgentRegistry,
    spatial: &dyn SpatialQuery,
    config: &SpawnerConfig,
    rng: &mut DeterministicRng,
) -> (Option<Vec2>, u32) {
    for attempt in 1..=config.max_attempts {
        let candidate = random_candidate(origin, config, rng);

        let Some(position) = ground_snap(candidate, origin, spatial, config) else {
            continue;
        };

        if is_spacing_clear(position, registry, config.min_spacing) {
            return (Some(position), attempt);
        }
    }

    (None, config.max_attempts)
}

/// Search with the unchecked fallback (`origin + small random x offset`).
pub fn find_spawn_position(
    origin: Vec2,
    registry: &AgentRegistry,
    spatial: &dyn SpatialQuery,
    config: &SpawnerConfig,
    rng: &mut DeterministicRng,
) -> Placement {
    match search_spawn_position(origin, registry, spatial, config, rng) {
        (Some(position), attempts) => Placement {
            position,
            attempts,
            fallback: false,
        },
        (None, attempts) => {
            let dx = (rng.rng.gen::<f32>() * 2.0 - 1.0) * config.fallback_offset;
            let position = origin + Vec2::new(dx, 0.0);
            logger::log_warning(&format!(
                "⚠️ Spawn placement failed after {} attempts, falling back to {:?} (spacing unchecked)",
                attempts, position
            ));
            Placement {
                position,
                attempts,
                fallback: true,
            }
        }
    }
}

fn random_candidate(origin: Vec2, config: &SpawnerConfig, rng: &mut DeterministicRng) -> Vec2 {
    let angle = rng.rng.gen::<f32>() * TAU;
    let radius = config.min_spawn_radius + rng.rng.gen::<f32>() * (config.spawn_radius - config.min_spawn_radius);
    origin + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Raycast down from well above the candidate column; miss → None.
fn ground_snap(candidate: Vec2, origin: Vec2, spatial: &dyn SpatialQuery, config: &SpawnerConfig) -> Option<Vec2> {
    let top = Vec2::new(candidate.x, origin.y + config.raycast_height);
    let hit = spatial.raycast(top, Vec2::NEG_Y, config.raycast_height * 2.0, MASK_GROUND)?;
    Some(Vec2::new(candidate.x, hit.point.y + config.ground_offset))
}

/// No live enemy strictly closer than `min_spacing`.
pub fn is_spacing_clear(position: Vec2, registry: &AgentRegistry, min_spacing: f32) -> bool {
    registry
        .enemies()
        .filter(|e| !e.is_dead())
        .all(|e| e.position.distance(position) >= min_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnemyStats;
    use crate::physics::ArenaWorld;

    #[test]
    fn test_placement_on_ground_within_ring() {
        let world = ArenaWorld::flat(0.0, 50.0);
        let registry = AgentRegistry::new();
        let config = SpawnerConfig::default();
        let mut rng = DeterministicRng::new(7);

        for _ in 0..20 {
            let placement = find_spawn_position(Vec2::ZERO, &registry, &world, &config, &mut rng);
            assert!(!placement.fallback);
            assert_eq!(placement.attempts, 1); // пустая арена: первая попытка валидна
            assert!((placement.position.y - config.ground_offset).abs() < 1e-5);
            assert!(placement.position.x.abs() <= config.spawn_radius + 1e-4);
        }
    }

    #[test]
    fn test_spacing_rejects_crowded_candidates() {
        let world = ArenaWorld::flat(0.0, 50.0);
        let mut registry = AgentRegistry::new();
        let config = SpawnerConfig::default();
        let mut rng = DeterministicRng::new(11);

        // 4 × (±2) блокирует не больше 12 из 16 единиц по x → место всегда есть
        let mut placed = Vec::new();
        for _ in 0..4 {
            let placement = find_spawn_position(Vec2::ZERO, &registry, &world, &config, &mut rng);
            assert!(!placement.fallback);
            registry.spawn_enemy(placement.position, EnemyStats::default());
            placed.push(placement.position);
        }

        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                assert!(a.distance(*b) >= config.min_spacing);
            }
        }
    }

    #[test]
    fn test_no_ground_falls_back() {
        let world = ArenaWorld::new(); // пол отсутствует → все raycast'ы промахиваются
        let registry = AgentRegistry::new();
        let config = SpawnerConfig::default();
        let mut rng = DeterministicRng::new(3);

        let origin = Vec2::new(10.0, 0.0);
        let placement = find_spawn_position(origin, &registry, &world, &config, &mut rng);
        assert!(placement.fallback);
        assert_eq!(placement.attempts, 50);
        assert!((placement.position.x - origin.x).abs() <= config.fallback_offset);
        assert_eq!(placement.position.y, origin.y);

        let (strict, attempts) = search_spawn_position(origin, &registry, &world, &config, &mut rng);
        assert!(strict.is_none());
        assert_eq!(attempts, 50);
    }

    #[test]
    fn test_dead_enemies_do_not_block_spacing() {
        let mut registry = AgentRegistry::new();
        let corpse = registry.spawn_enemy(Vec2::new(4.0, 0.5), EnemyStats::default());
        assert!(!is_spacing_clear(Vec2::new(4.5, 0.5), &registry, 2.0));

        registry.apply_damage(corpse, 1000);
        assert!(is_spacing_clear(Vec2::new(4.5, 0.5), &registry, 2.0));
    }
}

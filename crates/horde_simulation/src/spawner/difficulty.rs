//! Difficulty scaling
//!
//! Множители применяются к base stats только при spawn. Уже живых врагов
//! меняет лишь явный one-shot `rescale_live_enemies` (без per-tick polling).

use serde::{Deserialize, Serialize};

use crate::components::{EnemyStats, Health};
use crate::registry::AgentRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyScale {
    pub health: f32,
    pub speed: f32,
    pub damage: f32,
}

impl Default for DifficultyScale {
    fn default() -> Self {
        Self {
            health: 1.0,
            speed: 1.0,
            damage: 1.0,
        }
    }
}

impl DifficultyScale {
    /// Negative / non-finite multipliers → 0 (health floor is 1 HP anyway).
    pub fn sanitized(self) -> Self {
        let clean = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            health: clean(self.health),
            speed: clean(self.speed),
            damage: clean(self.damage),
        }
    }

    /// Scaled copy of `base` (health, speed, damage only).
    pub fn apply(&self, base: &EnemyStats) -> EnemyStats {
        EnemyStats {
            max_health: ((base.max_health as f32 * self.health).round() as i32).max(1),
            move_speed: base.move_speed * self.speed,
            damage: (base.damage as f32 * self.damage).round() as i32,
            ..*base
        }
    }
}

/// One-shot overwrite of every live enemy's stats with `scale` applied to `base`.
///
/// Current health keeps its fraction of max (живой враг не умирает от rescale).
/// Returns how many enemies were rescaled.
pub fn rescale_live_enemies(registry: &mut AgentRegistry, base: &EnemyStats, scale: &DifficultyScale) -> usize {
    let stats = scale.apply(base);
    let mut rescaled = 0;

    for enemy in registry.enemies_mut().filter(|e| !e.is_dead()) {
        let fraction = enemy.health.fraction();
        enemy.stats = stats;
        enemy.health = Health {
            current: ((stats.max_health as f32 * fraction).round() as i32).clamp(1, stats.max_health),
            max: stats.max_health,
        };
        rescaled += 1;
    }

    rescaled
}

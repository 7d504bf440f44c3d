//! Simulation configuration
//!
//! Читается только при spawn/construction (не каждый tick).
//! Все секции `#[serde(default)]` → частичный RON файл валиден.
//!
//! ```ron
//! (
//!     enemy: (move_speed: 3.0, damage: 15),
//!     spawner: (target_count: 20),
//! )
//! ```

mod error;

pub use error::ConfigError;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::components::EnemyStats;
use crate::logger;

/// Минимум для любых радиусов/дистанций/скоростей после clamp.
pub const MIN_DISTANCE: f32 = 0.01;

#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enemy: EnemyConfig,
    pub combat: CombatConfig,
    pub player: PlayerConfig,
    pub spawner: SpawnerConfig,
    pub physics: PhysicsConfig,
}

/// Base enemy stats (before difficulty scaling) + crowd parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: i32,
    pub move_speed: f32,
    pub damage: i32,
    pub detection_radius: f32,
    pub attack_range: f32,
    pub stop_distance: f32,
    pub attack_cooldown: f32,
    pub body_radius: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,
    /// Seconds between Dead and removal from the registry
    pub death_fade: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 30,
            move_speed: 2.5,
            damage: 20,
            detection_radius: 6.0,
            attack_range: 1.0,
            stop_distance: 0.3,
            attack_cooldown: 2.0,
            body_radius: 0.3,
            separation_radius: 1.0,
            separation_strength: 0.5,
            death_fade: 1.0,
        }
    }
}

impl EnemyConfig {
    pub fn base_stats(&self) -> EnemyStats {
        EnemyStats {
            max_health: self.max_health,
            move_speed: self.move_speed,
            damage: self.damage,
            detection_radius: self.detection_radius,
            attack_range: self.attack_range,
            stop_distance: self.stop_distance,
            attack_cooldown: self.attack_cooldown,
            body_radius: self.body_radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Commit → resolve delay
    pub attack_resolve_delay: f32,
    /// Commit → backup clear of the attacking flag
    pub attack_clear_delay: f32,
    pub knockback_force: f32,
    pub knockback_duration: f32,
    /// Velocity multiplier on knockback exit
    pub knockback_exit_damping: f32,
    /// Player above enemy by more than this while rising → "jumped over"
    pub vertical_clearance: f32,
    /// `|dx| ≤ attack_range × factor`
    pub horizontal_clearance_factor: f32,
    pub line_of_sight_check: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_resolve_delay: 0.2,
            attack_clear_delay: 1.0,
            knockback_force: 8.0,
            knockback_duration: 0.5,
            knockback_exit_damping: 0.5,
            vertical_clearance: 1.2,
            horizontal_clearance_factor: 0.8,
            line_of_sight_check: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: i32,
    pub attack_damage: i32,
    pub body_radius: f32,
    /// Active (damaging) part of the swing
    pub window_active: f32,
    /// Whole swing; `is_attacking` держится всё это время
    pub window_total: f32,
    /// Right-facing offset from the player position (mirrored for Left)
    pub window_offset: [f32; 2],
    pub window_half_extents: [f32; 2],
    /// Post-hit immunity
    pub immunity_duration: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            attack_damage: 10,
            body_radius: 0.4,
            window_active: 0.2,
            window_total: 0.5,
            window_offset: [0.7, 0.0],
            window_half_extents: [0.6, 0.5],
            immunity_duration: 1.0,
        }
    }
}

impl PlayerConfig {
    pub fn window_offset(&self) -> Vec2 {
        Vec2::from(self.window_offset)
    }

    pub fn window_half_extents(&self) -> Vec2 {
        Vec2::from(self.window_half_extents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Spawner position in the arena
    pub origin: [f32; 2],
    /// Population target (maxLiveCount)
    pub target_count: usize,
    pub spawn_radius: f32,
    pub min_spawn_radius: f32,
    /// Minimum Euclidean distance between a candidate and any live enemy
    pub min_spacing: f32,
    /// Placement attempts before the unchecked fallback
    pub max_attempts: u32,
    pub ground_offset: f32,
    /// Высота старта raycast'а вниз над кандидатом
    pub raycast_height: f32,
    /// Fallback: origin + random x in [-offset, offset]
    pub fallback_offset: f32,
    pub time_between_spawns: f32,
    pub respawn_interval: f32,
    /// Forced spawn budget = factor × count
    pub forced_budget_factor: u32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            target_count: 10,
            spawn_radius: 8.0,
            min_spawn_radius: 3.0,
            min_spacing: 2.0,
            max_attempts: 50,
            ground_offset: 0.5,
            raycast_height: 20.0,
            fallback_offset: 1.0,
            time_between_spawns: 0.5,
            respawn_interval: 5.0,
            forced_budget_factor: 3,
        }
    }
}

impl SpawnerConfig {
    pub fn origin(&self) -> Vec2 {
        Vec2::from(self.origin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed tick rate (Hz): задаёт и `Time<Fixed>`, и `SimClock`
    pub tick_hz: f32,
    pub gravity: f32,
    /// Ground snap: raycast вниз стартует на probe выше позиции
    pub ground_probe: f32,
    /// Высота центра тела над землёй в покое
    pub ground_clearance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            gravity: -20.0,
            ground_probe: 0.5,
            ground_clearance: 0.5,
        }
    }
}

// ============================================================================
// Loading + clamping
// ============================================================================

impl SimulationConfig {
    /// Parse RON, then clamp to safe values.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Self::parse(source, "<inline>")
    }

    /// Load from a RON file, then clamp to safe values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

        let config = Self::parse(&contents, &path.display().to_string())?;
        logger::log_info(&format!("⚙️ Loaded simulation config from {}", path.display()));
        Ok(config)
    }

    fn parse(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: SimulationConfig = ron::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            details: e.to_string(),
        })?;
        Ok(raw.sanitized())
    }

    /// Clamps invalid values to safe minimums (never an error).
    ///
    /// Каждый clamp логируется warning'ом.
    pub fn sanitized(mut self) -> Self {
        let mut clamps = Clamps::default();

        let enemy = &mut self.enemy;
        clamps.at_least_i32("enemy.max_health", &mut enemy.max_health, 1);
        clamps.at_least_i32("enemy.damage", &mut enemy.damage, 0);
        clamps.at_least("enemy.move_speed", &mut enemy.move_speed, MIN_DISTANCE);
        clamps.at_least("enemy.detection_radius", &mut enemy.detection_radius, MIN_DISTANCE);
        clamps.at_least("enemy.attack_range", &mut enemy.attack_range, MIN_DISTANCE);
        clamps.at_least("enemy.stop_distance", &mut enemy.stop_distance, 0.0);
        clamps.at_least("enemy.attack_cooldown", &mut enemy.attack_cooldown, 0.0);
        clamps.at_least("enemy.body_radius", &mut enemy.body_radius, MIN_DISTANCE);
        clamps.at_least("enemy.separation_radius", &mut enemy.separation_radius, MIN_DISTANCE);
        clamps.at_least("enemy.separation_strength", &mut enemy.separation_strength, 0.0);
        clamps.at_least("enemy.death_fade", &mut enemy.death_fade, 0.0);

        // stop_distance < attack_range < detection_radius
        if enemy.attack_range >= enemy.detection_radius {
            let fixed = enemy.detection_radius * 0.9;
            clamps.note("enemy.attack_range", enemy.attack_range, fixed);
            enemy.attack_range = fixed;
        }
        if enemy.stop_distance >= enemy.attack_range {
            let fixed = enemy.attack_range * 0.5;
            clamps.note("enemy.stop_distance", enemy.stop_distance, fixed);
            enemy.stop_distance = fixed;
        }

        let combat = &mut self.combat;
        clamps.at_least("combat.attack_resolve_delay", &mut combat.attack_resolve_delay, 0.0);
        clamps.at_least("combat.attack_clear_delay", &mut combat.attack_clear_delay, 0.0);
        clamps.at_least("combat.knockback_force", &mut combat.knockback_force, 0.0);
        clamps.at_least("combat.knockback_duration", &mut combat.knockback_duration, 0.0);
        clamps.within("combat.knockback_exit_damping", &mut combat.knockback_exit_damping, 0.0, 1.0);
        clamps.at_least("combat.vertical_clearance", &mut combat.vertical_clearance, 0.0);
        clamps.within(
            "combat.horizontal_clearance_factor",
            &mut combat.horizontal_clearance_factor,
            0.0,
            1.0,
        );
        // Backup clear не может сработать раньше resolve
        if combat.attack_clear_delay < combat.attack_resolve_delay {
            clamps.note(
                "combat.attack_clear_delay",
                combat.attack_clear_delay,
                combat.attack_resolve_delay,
            );
            combat.attack_clear_delay = combat.attack_resolve_delay;
        }

        let player = &mut self.player;
        clamps.at_least_i32("player.max_health", &mut player.max_health, 1);
        clamps.at_least_i32("player.attack_damage", &mut player.attack_damage, 0);
        clamps.at_least("player.body_radius", &mut player.body_radius, MIN_DISTANCE);
        clamps.at_least("player.window_active", &mut player.window_active, 0.0);
        clamps.at_least("player.window_total", &mut player.window_total, player.window_active);
        clamps.at_least("player.window_half_extents.x", &mut player.window_half_extents[0], MIN_DISTANCE);
        clamps.at_least("player.window_half_extents.y", &mut player.window_half_extents[1], MIN_DISTANCE);
        clamps.at_least("player.immunity_duration", &mut player.immunity_duration, 0.0);

        let spawner = &mut self.spawner;
        clamps.at_least("spawner.min_spawn_radius", &mut spawner.min_spawn_radius, 0.0);
        clamps.at_least("spawner.spawn_radius", &mut spawner.spawn_radius, spawner.min_spawn_radius);
        clamps.at_least("spawner.min_spacing", &mut spawner.min_spacing, 0.0);
        clamps.at_least("spawner.raycast_height", &mut spawner.raycast_height, MIN_DISTANCE);
        clamps.at_least("spawner.fallback_offset", &mut spawner.fallback_offset, 0.0);
        clamps.at_least("spawner.time_between_spawns", &mut spawner.time_between_spawns, 0.0);
        // Нулевой interval зациклил бы respawn check в пределах одного tick
        clamps.at_least("spawner.respawn_interval", &mut spawner.respawn_interval, MIN_DISTANCE);
        if spawner.max_attempts == 0 {
            clamps.note("spawner.max_attempts", 0.0, 1.0);
            spawner.max_attempts = 1;
        }
        if spawner.forced_budget_factor == 0 {
            clamps.note("spawner.forced_budget_factor", 0.0, 1.0);
            spawner.forced_budget_factor = 1;
        }

        clamps.at_least("physics.tick_hz", &mut self.physics.tick_hz, 1.0);
        clamps.at_least("physics.ground_probe", &mut self.physics.ground_probe, 0.0);
        clamps.at_least("physics.ground_clearance", &mut self.physics.ground_clearance, 0.0);

        clamps.report();
        self
    }
}

/// Collects clamp notes so they're logged once, after the pass.
#[derive(Default)]
struct Clamps {
    notes: Vec<String>,
}

impl Clamps {
    fn at_least(&mut self, name: &str, value: &mut f32, min: f32) {
        if !value.is_finite() || *value < min {
            self.note(name, *value, min);
            *value = min;
        }
    }

    fn within(&mut self, name: &str, value: &mut f32, min: f32, max: f32) {
        if !value.is_finite() {
            self.note(name, *value, min);
            *value = min;
        } else if *value < min || *value > max {
            let fixed = value.clamp(min, max);
            self.note(name, *value, fixed);
            *value = fixed;
        }
    }

    fn at_least_i32(&mut self, name: &str, value: &mut i32, min: i32) {
        if *value < min {
            self.note(name, *value as f32, min as f32);
            *value = min;
        }
    }

    fn note(&mut self, name: &str, from: f32, to: f32) {
        self.notes.push(format!("{}: {} → {}", name, from, to));
    }

    fn report(self) {
        for note in &self.notes {
            logger::log_warning(&format!("⚠️ Config clamped {}", note));
        }
    }
}

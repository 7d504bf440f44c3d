//! Enemy record: state machine state, stats, body, attack commit.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::actor::{AgentId, Facing, Health};
use crate::physics::{DamageOutcome, Damageable};

/// Enemy FSM состояния
///
/// Инвариант: `health ≤ 0 ⟺ Dead` (Dead терминален).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum EnemyState {
    /// Игрок вне detection radius (или его нет)
    #[default]
    Idle,
    /// Detected, moving toward the player (or holding at stop distance)
    Pursuing,
    /// Attack committed and in flight
    Attacking,
    /// Forced displacement after a hit; AI suppressed until `knockback_until`
    Knockback,
    /// Terminal; only the death-fade timer remains
    Dead,
}

/// Per-enemy stats, fixed at spawn time (difficulty-scaled).
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct EnemyStats {
    pub max_health: i32,
    pub move_speed: f32,
    pub damage: i32,
    pub detection_radius: f32,
    pub attack_range: f32,
    pub stop_distance: f32,
    /// Seconds between attack commits
    pub attack_cooldown: f32,
    pub body_radius: f32,
}

impl Default for EnemyStats {
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
        }
    }
}

/// An attack that has been committed and cannot be cancelled by re-evaluation.
///
/// `commit`: порядковый номер атаки этого врага: timers несут его с собой,
/// поэтому запоздалый timer старой атаки не трогает новую.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AttackCommit {
    pub commit: u32,
    pub committed_at: f32,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Enemy {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub health: Health,
    pub state: EnemyState,
    pub stats: EnemyStats,
    /// `None` = никогда не атаковал (cooldown считается истёкшим)
    pub last_attack_time: Option<f32>,
    /// Meaningful only in `Knockback`
    pub knockback_until: f32,
    /// `Some` while the "attacking" flag is set
    pub attack: Option<AttackCommit>,
    pub died_at: Option<f32>,
    /// Commits issued so far (source of `AttackCommit::commit`)
    pub attack_commits: u32,
    /// Impulses since the last physics step (Δv, mass = 1)
    pub pending_impulse: Vec2,
    /// Continuous forces since the last physics step (integrated × dt)
    pub pending_force: Vec2,
}

impl Enemy {
    pub fn new(id: AgentId, position: Vec2, stats: EnemyStats) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            health: Health::new(stats.max_health),
            state: EnemyState::Idle,
            stats,
            last_attack_time: None,
            knockback_until: 0.0,
            attack: None,
            died_at: None,
            attack_commits: 0,
            pending_impulse: Vec2::ZERO,
            pending_force: Vec2::ZERO,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    /// True if `commit` is the attack currently in flight.
    pub fn is_current_commit(&self, commit: u32) -> bool {
        self.attack.is_some_and(|a| a.commit == commit)
    }

    /// `now ≥ lastAttackTime + attackCooldown`
    pub fn cooldown_elapsed(&self, now: f32) -> bool {
        self.last_attack_time
            .map_or(true, |last| now >= last + self.stats.attack_cooldown)
    }

    pub fn in_knockback(&self, now: f32) -> bool {
        self.state == EnemyState::Knockback && now < self.knockback_until
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Kill switch for the record itself: zero velocity, drop queued forces.
    pub(crate) fn mark_dead(&mut self) {
        self.state = EnemyState::Dead;
        self.velocity = Vec2::ZERO;
        self.pending_impulse = Vec2::ZERO;
        self.pending_force = Vec2::ZERO;
        self.attack = None;
    }
}

impl Damageable for Enemy {
    fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::default();
        }

        let applied = self.health.take_damage(amount);
        let died = !self.health.is_alive();
        if died {
            self.mark_dead();
        }

        DamageOutcome { applied, died }
    }

    fn is_alive(&self) -> bool {
        !self.is_dead()
    }
}

//! Player record (external agent, mutated through a narrow capability)
//!
//! Позицию/скорость/facing пишет input слой хоста (`PlayerCommand::Sync`);
//! core только читает их и меняет health, `is_attacking`, `is_immune`.

use bevy::prelude::*;

use super::actor::{AgentId, Facing, Health};
use crate::physics::{DamageOutcome, Damageable};

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Player {
    pub id: AgentId,
    pub position: Vec2,
    /// Vertical component decides the "jumped over" check
    pub velocity: Vec2,
    pub facing: Facing,
    pub health: Health,
    pub attack_damage: i32,
    /// Time-boxed, uncancellable once committed
    pub is_attacking: bool,
    /// Time-boxed post-hit immunity
    pub is_immune: bool,
    pub body_radius: f32,
}

impl Player {
    pub fn new(id: AgentId, position: Vec2, max_health: i32, attack_damage: i32) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            health: Health::new(max_health),
            attack_damage,
            is_attacking: false,
            is_immune: false,
            body_radius: 0.4,
        }
    }

    /// Moving upward this tick
    pub fn is_rising(&self) -> bool {
        self.velocity.y > 0.0
    }
}

impl Damageable for Player {
    fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.health.is_alive() {
            return DamageOutcome::default();
        }

        let applied = self.health.take_damage(amount);
        DamageOutcome {
            applied,
            died: !self.health.is_alive(),
        }
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

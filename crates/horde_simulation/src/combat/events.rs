//! Simulation events (input + output) и outbox для core функций.
//!
//! Core логика не трогает bevy `EventWriter` напрямую: она складывает
//! события в `EventOutbox`, а `publish_simulation_events` в конце tick'а
//! переносит их в bevy events (порядок внутри типа сохраняется).

use bevy::prelude::*;

use crate::components::{AgentId, Facing};

// ============================================================================
// Input (host → core)
// ============================================================================

/// Player capability: host input layer двигает игрока и стартует атаки.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Mirror the host-owned body into the registry
    Sync {
        position: Vec2,
        velocity: Vec2,
        facing: Facing,
    },
    /// Start a melee swing (ignored while one is in progress)
    Attack,
}

// ============================================================================
// Output (core → host)
// ============================================================================

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawned {
    pub id: AgentId,
    pub position: Vec2,
    /// Placement exhausted its retry budget (spacing not validated)
    pub fallback: bool,
}

/// Событие: урон нанесён
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageDealt {
    pub attacker: AgentId,
    pub target: AgentId,
    pub amount: i32,
    pub target_died: bool,
}

/// Событие: агент умер (health <= 0)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDied {
    pub entity: AgentId,
    pub killer: Option<AgentId>,
}

/// Death fade закончился, враг удалён из registry.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyDespawned {
    pub id: AgentId,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResolved {
    pub enemy: AgentId,
    pub verdict: AttackVerdict,
}

/// Outcome of an enemy attack re-validation at resolve time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackVerdict {
    Hit,
    Denied(DenyReason),
}

/// Why a committed enemy attack dealt no damage (expected branch, not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Player absent or dead
    NoTarget,
    TargetImmune,
    /// Attacking player can't be damaged
    TargetAttacking,
    OutOfRange,
    LineOfSightBlocked,
    JumpedOver,
    HorizontalClearance,
    FacingAway,
}

/// Events produced by core functions during one tick.
#[derive(Resource, Debug, Default)]
pub struct EventOutbox {
    pub spawned: Vec<EnemySpawned>,
    pub damage: Vec<DamageDealt>,
    pub died: Vec<EntityDied>,
    pub despawned: Vec<EnemyDespawned>,
    pub resolved: Vec<AttackResolved>,
}

impl EventOutbox {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty()
            && self.damage.is_empty()
            && self.died.is_empty()
            && self.despawned.is_empty()
            && self.resolved.is_empty()
    }
}

/// System: flush outbox → bevy events (последний в tick'е).
pub fn publish_simulation_events(
    mut outbox: ResMut<EventOutbox>,
    mut spawned: EventWriter<EnemySpawned>,
    mut damage: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
    mut despawned: EventWriter<EnemyDespawned>,
    mut resolved: EventWriter<AttackResolved>,
) {
    if outbox.is_empty() {
        return;
    }

    spawned.write_batch(outbox.spawned.drain(..));
    damage.write_batch(outbox.damage.drain(..));
    died.write_batch(outbox.died.drain(..));
    despawned.write_batch(outbox.despawned.drain(..));
    resolved.write_batch(outbox.resolved.drain(..));
}

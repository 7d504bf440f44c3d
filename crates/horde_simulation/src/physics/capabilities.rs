//! Capability contracts between the simulation core and its collaborators.
//!
//! # Architecture
//!
//! **Core (strategic layer):** AI state, attack commits, damage rules.
//!
//! **Collaborators (tactical layer):**
//! - `SpatialQuery`: circle overlap + raycast, supplied by a physics engine
//! - `PhysicsBody`: impulses / velocity writes on an agent body
//! - `Damageable`: the single damage entry point on every damageable record
//! - `AnimationBridge`: purely observational movement parameter
//!
//! Core никогда не ищет объекты по тегу/типу: всё адресуется через `AgentId`.

use bevy::prelude::*;

use crate::components::AgentId;

// ============================================================================
// Collision layers (битовые маски для query filter)
// ============================================================================

/// Layer: terrain the spawner and physics step stand on
pub const LAYER_GROUND: u32 = 0b0001;

/// Layer: walls/obstacles that block line of sight
pub const LAYER_OBSTACLE: u32 = 0b0010;

/// Layer: enemy bodies
pub const LAYER_ENEMY: u32 = 0b0100;

/// Layer: the player body
pub const LAYER_PLAYER: u32 = 0b1000;

/// Mask: line-of-sight raycast (только препятствия, игрок не блокирует сам себя)
pub const MASK_LINE_OF_SIGHT: u32 = LAYER_OBSTACLE;

/// Mask: placement / ground-snap raycast
pub const MASK_GROUND: u32 = LAYER_GROUND;

// ============================================================================
// Query results
// ============================================================================

/// What a raycast hit: a registry agent or a piece of static geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderId {
    Agent(AgentId),
    Static(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub collider: ColliderId,
    /// Точка попадания в world coordinates
    pub point: Vec2,
    /// Distance from the ray origin along the (normalized) direction
    pub distance: f32,
}

/// Agent body as mirrored into a provider that does not own bodies itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentCollider {
    pub id: AgentId,
    pub center: Vec2,
    pub radius: f32,
    pub layer: u32,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Spatial queries supplied by the physics engine.
///
/// Ids returned by `overlap_circle` may be stale (despawned since the
/// provider last synced); callers treat those as "no match".
pub trait SpatialQuery {
    /// Agents whose bodies overlap the circle, filtered by layer mask.
    fn overlap_circle(&self, center: Vec2, radius: f32, filter: u32) -> Vec<AgentId>;

    /// Nearest hit along `direction` within `max_distance`, filtered by layer mask.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: u32) -> Option<RaycastHit>;

    /// Mirror registry bodies. Engine-backed providers track bodies themselves
    /// and keep this no-op.
    fn sync_agents(&mut self, _agents: &[AgentCollider]) {}
}

/// Instantaneous forces / velocity writes on an agent body.
pub trait PhysicsBody {
    fn apply_impulse(&mut self, id: AgentId, impulse: Vec2);
    fn set_velocity(&mut self, id: AgentId, velocity: Vec2);
}

/// Result of one `Damageable::apply_damage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageOutcome {
    /// HP actually removed (0 if the target was already dead)
    pub applied: i32,
    /// The hit took the target from alive to dead
    pub died: bool,
}

/// Единственный способ нанести урон: Player и Enemy реализуют его явно.
pub trait Damageable {
    fn apply_damage(&mut self, amount: i32) -> DamageOutcome;
    fn is_alive(&self) -> bool;
}

/// Purely observational animation hook; the core never reads animation state.
pub trait AnimationBridge {
    fn set_movement_param(&mut self, id: AgentId, value: f32);
}

/// Default bridge when nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimationBridge;

impl AnimationBridge for NullAnimationBridge {
    fn set_movement_param(&mut self, _id: AgentId, _value: f32) {}
}

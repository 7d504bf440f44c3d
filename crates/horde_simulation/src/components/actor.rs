//! Базовые типы агентов: AgentId, Health, Facing

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity агента (enemy или player) внутри `AgentRegistry`.
///
/// Выдаётся registry монотонно и никогда не переиспользуется, поэтому
/// id despawned врага не может "ожить" под другим агентом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Здоровье агента
///
/// Инвариант: current ≤ max; агент жив пока current > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(30)
    }
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Снимает `amount` HP (не ниже нуля), возвращает фактически снятое.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        let before = self.current;
        self.current = (self.current - amount).max(0);
        before - self.current
    }

    pub fn heal(&mut self, amount: i32) {
        self.current = (self.current + amount.max(0)).min(self.max);
    }

    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }
}

/// Horizontal facing of a 2D agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    /// +1.0 for Right, -1.0 for Left.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    /// Facing implied by a horizontal delta; `None` when the delta is ~zero.
    pub fn from_delta_x(dx: f32) -> Option<Self> {
        if dx > f32::EPSILON {
            Some(Facing::Right)
        } else if dx < -f32::EPSILON {
            Some(Facing::Left)
        } else {
            None
        }
    }

    /// Mirrors a right-facing offset to this facing.
    pub fn mirror(self, offset: Vec2) -> Vec2 {
        Vec2::new(offset.x * self.sign(), offset.y)
    }

    /// True if an agent at `from_x` with this facing looks toward `to_x`.
    /// Same column counts as facing.
    pub fn faces(self, from_x: f32, to_x: f32) -> bool {
        let dx = to_x - from_x;
        match self {
            Facing::Right => dx >= 0.0,
            Facing::Left => dx <= 0.0,
        }
    }
}

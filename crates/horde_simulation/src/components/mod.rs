//! Agent records
//!
//! Организация по доменам:
//! - actor: базовые типы (AgentId, Health, Facing)
//! - enemy: Enemy record (EnemyState, EnemyStats, AttackCommit)
//! - player: Player record (external agent)

pub mod actor;
pub mod enemy;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use enemy::*;
pub use player::*;

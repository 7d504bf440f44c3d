//! Borrowed view of everything a core step touches in one tick.

use crate::combat::EventOutbox;
use crate::config::SimulationConfig;
use crate::physics::SpatialQuery;
use crate::registry::AgentRegistry;
use crate::schedule::TimerQueue;

/// Явная инъекция вместо глобальных lookup'ов: AI, combat и spawner
/// получают registry/timers/queries только через этот context.
///
/// Systems собирают его из resources (`&mut *registry`), тесты из
/// локальных значений.
pub struct SimContext<'a> {
    pub registry: &'a mut AgentRegistry,
    pub timers: &'a mut TimerQueue,
    pub outbox: &'a mut EventOutbox,
    pub spatial: &'a dyn SpatialQuery,
    pub config: &'a SimulationConfig,
    pub now: f32,
}

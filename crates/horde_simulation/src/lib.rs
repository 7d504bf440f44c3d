//! Horde Simulation Core
//!
//! Headless ECS-симуляция на Bevy 0.16 для 2.5D side-view арены:
//! spawner держит численность орды, враги преследуют игрока и
//! коммитят отложенные атаки, игрок бьёт через attack windows.
//!
//! Граница с движком: capability traits (`physics::SpatialQuery`,
//! `PhysicsBody`, `Damageable`, `AnimationBridge`); рендер, ввод и
//! pathfinding живут снаружи.
//!
//! Порядок внутри одного FixedUpdate tick (`SimulationSet`):
//! Clock → Input → Timers → Spawning → Behavior → Combat → Physics → Sync

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod context;
pub mod logger;
pub mod physics;
pub mod registry;
pub mod schedule;
pub mod spawner;

// Re-export базовых типов для удобства
pub use ai::AIPlugin;
pub use combat::{
    AttackResolved, AttackVerdict, CombatPlugin, DamageDealt, DenyReason, EnemyDespawned, EnemySpawned, EntityDied,
    PlayerCommand,
};
pub use components::*;
pub use config::{ConfigError, SimulationConfig};
pub use context::SimContext;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use physics::{ArenaWorld, PhysicsStepPlugin, SpatialProvider};
pub use registry::AgentRegistry;
pub use schedule::{SimClock, TimerQueue};
pub use spawner::{DifficultyScale, SpawnerCommand, SpawnerPlugin, SpawnerState};

/// Фазы одного simulation tick (строго последовательно, `.chain()`).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// `SimClock` += 1 tick
    Clock,
    /// Host commands (player sync / attack)
    Input,
    /// Due timers: attack resolve, despawn, spawn pacing, respawn checks
    Timers,
    /// Spawner commands (forced fill, difficulty)
    Spawning,
    /// Enemy state machine
    Behavior,
    /// Player attack windows
    Combat,
    /// Body integration + ground snap
    Physics,
    /// Provider sync + outbox → bevy events
    Sync,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin {
    pub seed: u64,
    pub config: SimulationConfig,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            seed: 42,
            config: SimulationConfig::default(),
        }
    }
}

impl SimulationPlugin {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone().sanitized();
        let tick_hz = config.physics.tick_hz;

        app
            // Fixed timestep (60Hz по умолчанию) для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(tick_hz as f64))
            .insert_resource(SimClock::from_hz(tick_hz))
            // Детерминистичный RNG (placement, fallback offsets)
            .insert_resource(DeterministicRng::new(self.seed))
            .insert_resource(config)
            .init_resource::<AgentRegistry>()
            .init_resource::<TimerQueue>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Clock,
                SimulationSet::Input,
                SimulationSet::Timers,
                SimulationSet::Spawning,
                SimulationSet::Behavior,
                SimulationSet::Combat,
                SimulationSet::Physics,
                SimulationSet::Sync,
            )
                .chain(),
        );

        app.add_systems(FixedUpdate, schedule::advance_clock.in_set(SimulationSet::Clock))
            .add_systems(FixedUpdate, schedule::fire_due_timers.in_set(SimulationSet::Timers));

        // Подсистемы (config/timers уже вставлены → SpawnerPlugin видит origin)
        app.add_plugins((PhysicsStepPlugin, CombatPlugin, AIPlugin, SpawnerPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (default config)
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with(seed, SimulationConfig::default())
}

/// Headless App с заданным config.
pub fn create_headless_app_with(seed: u64, config: SimulationConfig) -> App {
    init_logger();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin { seed, config });
    app
}

/// Прогоняет ровно `ticks` fixed steps, минуя wall-clock accumulator.
///
/// `First` (а с ним bevy'шный event update) здесь не запускается, поэтому
/// перед каждым tick'ом event buffers сдвигаются вручную: события живут
/// два tick'а, как и при обычном `App::update`.
pub fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        update_simulation_events(app.world_mut());
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Swap/clear double buffers всех событий симуляции.
pub fn update_simulation_events(world: &mut World) {
    update_events::<PlayerCommand>(world);
    update_events::<SpawnerCommand>(world);
    update_events::<EnemySpawned>(world);
    update_events::<DamageDealt>(world);
    update_events::<EntityDied>(world);
    update_events::<EnemyDespawned>(world);
    update_events::<AttackResolved>(world);
}

fn update_events<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}

/// Snapshot registry для сравнения детерминизма.
///
/// BTreeMap уже упорядочен по `AgentId`; Debug-форма полная, включая
/// позиции и таймеры атак.
pub fn snapshot_registry(registry: &AgentRegistry) -> Vec<u8> {
    let mut snapshot = Vec::new();

    for enemy in registry.enemies() {
        snapshot.extend_from_slice(&enemy.id.0.to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", enemy).as_bytes());
    }

    if let Some(player) = registry.player() {
        snapshot.extend_from_slice(&player.id.0.to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", player).as_bytes());
    }

    snapshot
}

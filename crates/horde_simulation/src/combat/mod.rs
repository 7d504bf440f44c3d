//! Combat Resolver
//!
//! Два независимых пути урона, оба через committed attack windows
//! (никакого урона от пассивного касания тел):
//! - Enemy → Player: commit → resolve delay → re-validation → damage
//! - Player → Enemy: AttackWindow, hit-once на commit, knockback
//!
//! Core функции работают над `SimContext`; systems ниже только
//! собирают context из resources.

use bevy::prelude::*;

pub mod attack_window;
pub mod damage;
pub mod enemy_attack;
pub mod events;
pub mod validation;


// Re-export основных типов
pub use attack_window::{
    clear_player_attack, clear_player_immunity, process_attack_windows, start_player_attack, AttackWindow,
    AttackWindows,
};
pub use damage::{damage_enemy, damage_player, despawn_enemy, mark_enemy_dead};
pub use enemy_attack::{clear_enemy_attack, commit_enemy_attack, resolve_enemy_attack};
pub use events::{
    publish_simulation_events, AttackResolved, AttackVerdict, DamageDealt, DenyReason, EnemyDespawned,
    EnemySpawned, EntityDied, EventOutbox, PlayerCommand,
};
pub use validation::validate_enemy_attack;

use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::physics::SpatialProvider;
use crate::registry::AgentRegistry;
use crate::schedule::{SimClock, TimerQueue};
use crate::SimulationSet;

/// Combat Plugin
///
/// Регистрирует события и combat системы в FixedUpdate:
/// 1. `apply_player_commands` (Input): Sync тела игрока, старт swing'а
/// 2. `player_attack_windows` (Combat): hit detection активных окон
/// 3. `publish_simulation_events` (Sync): outbox → bevy events
///
/// Enemy attack resolve/clear идут через timers (`schedule::fire_due_timers`).
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<PlayerCommand>()
            .add_event::<EnemySpawned>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<EnemyDespawned>()
            .add_event::<AttackResolved>();

        app.init_resource::<EventOutbox>()
            .init_resource::<AttackWindows>();

        app.add_systems(FixedUpdate, apply_player_commands.in_set(SimulationSet::Input))
            .add_systems(FixedUpdate, player_attack_windows.in_set(SimulationSet::Combat))
            .add_systems(FixedUpdate, publish_simulation_events.in_set(SimulationSet::Sync));
    }
}

/// System: host input → player record (Sync) / swing start (Attack).
#[allow(clippy::too_many_arguments)]
pub fn apply_player_commands(
    mut commands: EventReader<PlayerCommand>,
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
    spatial: Res<SpatialProvider>,
    mut registry: ResMut<AgentRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut outbox: ResMut<EventOutbox>,
    mut windows: ResMut<AttackWindows>,
) {
    let mut ctx = SimContext {
        registry: &mut *registry,
        timers: &mut *timers,
        outbox: &mut *outbox,
        spatial: spatial.query(),
        config: &*config,
        now: clock.now(),
    };

    for command in commands.read() {
        match *command {
            PlayerCommand::Sync {
                position,
                velocity,
                facing,
            } => {
                if let Some(player) = ctx.registry.player_mut() {
                    player.position = position;
                    player.velocity = velocity;
                    player.facing = facing;
                }
            }
            PlayerCommand::Attack => {
                start_player_attack(&mut ctx, &mut windows);
            }
        }
    }
}

/// System: hit detection для всех активных AttackWindow.
pub fn player_attack_windows(
    clock: Res<SimClock>,
    config: Res<SimulationConfig>,
    spatial: Res<SpatialProvider>,
    mut registry: ResMut<AgentRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut outbox: ResMut<EventOutbox>,
    mut windows: ResMut<AttackWindows>,
) {
    if windows.is_empty() {
        return;
    }

    let mut ctx = SimContext {
        registry: &mut *registry,
        timers: &mut *timers,
        outbox: &mut *outbox,
        spatial: spatial.query(),
        config: &*config,
        now: clock.now(),
    };

    process_attack_windows(&mut ctx, &mut windows);
}

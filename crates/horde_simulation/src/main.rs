//! Headless прогон Horde
//!
//! Арена с полом и одним препятствием, неподвижный игрок, который бьёт
//! раз в секунду. Печатает численность орды и HP игрока.
//!
//! Аргументы: `[config.ron] [seed]`

use bevy::prelude::*;

use horde_simulation::{
    create_headless_app_with, log_error, run_ticks, AgentRegistry, ArenaWorld, PlayerCommand, SimulationConfig,
    SpatialProvider,
};

const TICKS_PER_SECOND: u32 = 60;
const SECONDS: u32 = 20;

fn main() {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => SimulationConfig::load(&path).unwrap_or_else(|err| {
            log_error(&format!("❌ {}, using defaults", err));
            SimulationConfig::default()
        }),
        None => SimulationConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    println!("Starting Horde headless simulation (seed: {})", seed);

    let mut app = create_headless_app_with(seed, config);
    // Уже sanitized версия из plugin'а
    let player = app.world().resource::<SimulationConfig>().player.clone();

    let mut arena = ArenaWorld::flat(0.0, 60.0);
    arena.add_obstacle(Vec2::new(-6.0, 0.0), Vec2::new(-5.0, 2.0));
    app.insert_resource(SpatialProvider::new(arena));
    app.world_mut()
        .resource_mut::<AgentRegistry>()
        .spawn_configured_player(Vec2::new(0.0, 0.5), &player);

    for second in 0..SECONDS {
        app.world_mut().send_event(PlayerCommand::Attack);
        run_ticks(&mut app, TICKS_PER_SECOND);

        let registry = app.world().resource::<AgentRegistry>();
        let hp = registry.player().map(|p| p.health.current).unwrap_or(0);
        println!(
            "t={:>2}s: {} enemies ({} alive), player HP {}",
            second + 1,
            registry.enemy_count(),
            registry.live_enemy_count(),
            hp
        );

        if hp <= 0 {
            println!("Player died");
            break;
        }
    }

    println!("Simulation complete!");
}

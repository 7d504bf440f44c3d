//! Agent Registry: canonical owner of every live Enemy and the Player.
//!
//! Все подсистемы (AI, combat, spawner) адресуют агентов только через
//! `AgentId`; никаких find-by-tag / find-by-type поисков.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::components::{AgentId, Enemy, EnemyStats, Player};
use crate::config::PlayerConfig;
use crate::physics::{AgentCollider, Damageable, DamageOutcome, PhysicsBody, LAYER_ENEMY, LAYER_PLAYER};

/// Registry resource
///
/// `BTreeMap` (а не HashMap) → итерация в порядке id, детерминизм между прогонами.
#[derive(Resource, Debug, Default)]
pub struct AgentRegistry {
    next_id: u32,
    enemies: BTreeMap<AgentId, Enemy>,
    player: Option<Player>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Регистрирует нового врага, возвращает его stable id.
    pub fn spawn_enemy(&mut self, position: Vec2, stats: EnemyStats) -> AgentId {
        let id = self.allocate_id();
        self.enemies.insert(id, Enemy::new(id, position, stats));
        id
    }

    /// Registers (or replaces) the player record.
    pub fn spawn_player(&mut self, position: Vec2, max_health: i32, attack_damage: i32) -> AgentId {
        let id = self.allocate_id();
        self.player = Some(Player::new(id, position, max_health, attack_damage));
        id
    }

    /// Player with health, damage and body radius from config.
    pub fn spawn_configured_player(&mut self, position: Vec2, config: &PlayerConfig) -> AgentId {
        let id = self.spawn_player(position, config.max_health, config.attack_damage);
        if let Some(player) = self.player.as_mut() {
            player.body_radius = config.body_radius;
        }
        id
    }

    pub fn enemy(&self, id: AgentId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn enemy_mut(&mut self, id: AgentId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn enemies_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.values_mut()
    }

    /// Ids in ascending order (snapshot, safe to mutate the registry while iterating).
    pub fn enemy_ids(&self) -> Vec<AgentId> {
        self.enemies.keys().copied().collect()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.enemies.contains_key(&id) || self.player_id() == Some(id)
    }

    pub fn remove_enemy(&mut self, id: AgentId) -> Option<Enemy> {
        self.enemies.remove(&id)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Registered and not Dead (fading corpses don't count).
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.values().filter(|e| !e.is_dead()).count()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    pub fn player_id(&self) -> Option<AgentId> {
        self.player.as_ref().map(|p| p.id)
    }

    /// Player record if present and alive
    pub fn live_player(&self) -> Option<&Player> {
        self.player.as_ref().filter(|p| p.is_alive())
    }

    pub fn position_of(&self, id: AgentId) -> Option<Vec2> {
        if let Some(enemy) = self.enemies.get(&id) {
            return Some(enemy.position);
        }
        self.player.as_ref().filter(|p| p.id == id).map(|p| p.position)
    }

    /// Единая точка dispatch урона (enemy или player).
    pub fn damageable_mut(&mut self, id: AgentId) -> Option<&mut dyn Damageable> {
        if let Some(enemy) = self.enemies.get_mut(&id) {
            return Some(enemy as &mut dyn Damageable);
        }
        match self.player.as_mut() {
            Some(player) if player.id == id => Some(player as &mut dyn Damageable),
            _ => None,
        }
    }

    /// Applies damage by id; stale id → `None` (treated as "no match").
    pub fn apply_damage(&mut self, id: AgentId, amount: i32) -> Option<DamageOutcome> {
        self.damageable_mut(id).map(|target| target.apply_damage(amount))
    }

    /// Body shapes for providers that mirror registry positions (dead enemies excluded).
    pub fn colliders(&self) -> Vec<AgentCollider> {
        let mut colliders: Vec<AgentCollider> = self
            .enemies
            .values()
            .filter(|e| !e.is_dead())
            .map(|e| AgentCollider {
                id: e.id,
                center: e.position,
                radius: e.stats.body_radius,
                layer: LAYER_ENEMY,
            })
            .collect();

        if let Some(player) = self.live_player() {
            colliders.push(AgentCollider {
                id: player.id,
                center: player.position,
                radius: player.body_radius,
                layer: LAYER_PLAYER,
            });
        }

        colliders
    }
}

impl PhysicsBody for AgentRegistry {
    /// Enemies: Δv накапливается до physics step. Player: Δv сразу в velocity
    /// (его body интегрирует хост, core только пишет).
    fn apply_impulse(&mut self, id: AgentId, impulse: Vec2) {
        if let Some(enemy) = self.enemies.get_mut(&id) {
            if !enemy.is_dead() {
                enemy.pending_impulse += impulse;
            }
            return;
        }
        if let Some(player) = self.player.as_mut().filter(|p| p.id == id) {
            player.velocity += impulse;
        }
    }

    fn set_velocity(&mut self, id: AgentId, velocity: Vec2) {
        if let Some(enemy) = self.enemies.get_mut(&id) {
            if !enemy.is_dead() {
                enemy.velocity = velocity;
            }
            return;
        }
        if let Some(player) = self.player.as_mut().filter(|p| p.id == id) {
            player.velocity = velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnemyState;

    #[test]
    fn test_ids_are_stable_and_never_reused() {
        let mut registry = AgentRegistry::new();
        let a = registry.spawn_enemy(Vec2::ZERO, EnemyStats::default());
        let b = registry.spawn_enemy(Vec2::X, EnemyStats::default());
        assert_ne!(a, b);

        registry.remove_enemy(a);
        let c = registry.spawn_enemy(Vec2::Y, EnemyStats::default());
        assert_ne!(a, c);
        assert!(registry.enemy(a).is_none());
        assert_eq!(registry.enemy_ids(), vec![b, c]);
    }

    #[test]
    fn test_damage_dispatch_by_id() {
        let mut registry = AgentRegistry::new();
        let enemy = registry.spawn_enemy(Vec2::ZERO, EnemyStats::default());
        let player = registry.spawn_player(Vec2::X, 100, 10);

        let outcome = registry.apply_damage(enemy, 30).expect("enemy is registered");
        assert!(outcome.died);
        assert_eq!(registry.enemy(enemy).map(|e| e.state), Some(EnemyState::Dead));
        assert_eq!(registry.live_enemy_count(), 0);
        assert_eq!(registry.enemy_count(), 1);

        let outcome = registry.apply_damage(player, 20).expect("player is registered");
        assert_eq!(outcome.applied, 20);
        assert_eq!(registry.player().map(|p| p.health.current), Some(80));

        // Stale id → no match
        assert!(registry.apply_damage(AgentId(999), 10).is_none());
    }

    #[test]
    fn test_impulse_accumulates_for_enemy() {
        let mut registry = AgentRegistry::new();
        let id = registry.spawn_enemy(Vec2::ZERO, EnemyStats::default());

        registry.apply_impulse(id, Vec2::new(8.0, 0.0));
        registry.apply_impulse(id, Vec2::new(-2.0, 0.0));

        let enemy = registry.enemy(id).expect("registered");
        assert_eq!(enemy.pending_impulse, Vec2::new(6.0, 0.0));
        assert_eq!(enemy.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_colliders_skip_dead() {
        let mut registry = AgentRegistry::new();
        let a = registry.spawn_enemy(Vec2::ZERO, EnemyStats::default());
        registry.spawn_enemy(Vec2::X, EnemyStats::default());
        registry.spawn_player(Vec2::Y, 100, 10);
        registry.apply_damage(a, 100);

        let colliders = registry.colliders();
        assert_eq!(colliders.len(), 2);
        assert!(colliders.iter().all(|c| c.id != a));
    }
}

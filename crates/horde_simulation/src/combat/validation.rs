//! Enemy → Player attack legality (re-checked at resolve time)
//!
//! Все условия конъюнктивны; проверяются по порядку, первое проваленное
//! становится `DenyReason`. Jumped-over идёт раньше дистанции: игрок,
//! перепрыгнувший врага, почти всегда ещё и вне радиуса, а причина
//! "перепрыгнул" точнее.

use bevy::prelude::*;

use super::events::{AttackVerdict, DenyReason};
use crate::components::{Enemy, Player};
use crate::config::CombatConfig;
use crate::physics::{SpatialQuery, MASK_LINE_OF_SIGHT};

pub fn validate_enemy_attack(
    enemy: &Enemy,
    player: Option<&Player>,
    spatial: &dyn SpatialQuery,
    config: &CombatConfig,
) -> AttackVerdict {
    match first_failed_check(enemy, player, spatial, config) {
        Some(reason) => AttackVerdict::Denied(reason),
        None => AttackVerdict::Hit,
    }
}

fn first_failed_check(
    enemy: &Enemy,
    player: Option<&Player>,
    spatial: &dyn SpatialQuery,
    config: &CombatConfig,
) -> Option<DenyReason> {
    let Some(player) = player.filter(|p| p.health.is_alive()) else {
        return Some(DenyReason::NoTarget);
    };

    if player.is_immune {
        return Some(DenyReason::TargetImmune);
    }
    if player.is_attacking {
        return Some(DenyReason::TargetAttacking);
    }

    if jumped_over(enemy.position, player, config.vertical_clearance) {
        return Some(DenyReason::JumpedOver);
    }

    let range = enemy.stats.attack_range;
    let distance = enemy.position.distance(player.position);
    if distance > range {
        return Some(DenyReason::OutOfRange);
    }

    if config.line_of_sight_check && line_of_sight_blocked(spatial, enemy.position, player.position) {
        return Some(DenyReason::LineOfSightBlocked);
    }

    if (player.position.x - enemy.position.x).abs() > range * config.horizontal_clearance_factor {
        return Some(DenyReason::HorizontalClearance);
    }

    if !enemy.facing.faces(enemy.position.x, player.position.x) {
        return Some(DenyReason::FacingAway);
    }

    None
}

/// player.y > enemy.y + clearance и игрок движется вверх
pub fn jumped_over(enemy_position: Vec2, player: &Player, clearance: f32) -> bool {
    player.position.y > enemy_position.y + clearance && player.is_rising()
}

/// Obstacle hit strictly before reaching `to`.
pub fn line_of_sight_blocked(spatial: &dyn SpatialQuery, from: Vec2, to: Vec2) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return false;
    }

    spatial
        .raycast(from, delta / distance, distance, MASK_LINE_OF_SIGHT)
        .is_some_and(|hit| hit.distance < distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentId, EnemyStats, Facing};
    use crate::physics::ArenaWorld;

    fn enemy_at(x: f32, facing: Facing) -> Enemy {
        let mut enemy = Enemy::new(AgentId(1), Vec2::new(x, 0.5), EnemyStats::default());
        enemy.facing = facing;
        enemy
    }

    fn player_at(position: Vec2) -> Player {
        Player::new(AgentId(0), position, 100, 10)
    }

    fn verdict(enemy: &Enemy, player: &Player, world: &ArenaWorld) -> AttackVerdict {
        validate_enemy_attack(enemy, Some(player), world, &CombatConfig::default())
    }

    #[test]
    fn test_clean_hit() {
        let world = ArenaWorld::flat(0.0, 50.0);
        let enemy = enemy_at(0.0, Facing::Right);
        let player = player_at(Vec2::new(0.7, 0.5));

        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Hit);
    }

    #[test]
    fn test_defender_state_denials() {
        let world = ArenaWorld::flat(0.0, 50.0);
        let enemy = enemy_at(0.0, Facing::Right);

        let mut player = player_at(Vec2::new(0.7, 0.5));
        player.is_immune = true;
        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Denied(DenyReason::TargetImmune));

        player.is_immune = false;
        player.is_attacking = true;
        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Denied(DenyReason::TargetAttacking));

        assert_eq!(
            validate_enemy_attack(&enemy, None, &world, &CombatConfig::default()),
            AttackVerdict::Denied(DenyReason::NoTarget)
        );
    }

    #[test]
    fn test_jumped_over_only_while_rising() {
        let world = ArenaWorld::flat(0.0, 50.0);
        let enemy = enemy_at(0.0, Facing::Right);
        let mut player = player_at(Vec2::new(0.0, 2.0));
        player.velocity = Vec2::new(0.0, 4.0);

        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Denied(DenyReason::JumpedOver));

        // Падает обратно: уже не "перепрыгнул", но всё ещё далеко
        player.velocity = Vec2::new(0.0, -4.0);
        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Denied(DenyReason::OutOfRange));
    }

    #[test]
    fn test_obstacle_blocks() {
        let mut world = ArenaWorld::flat(0.0, 50.0);
        world.add_obstacle(Vec2::new(0.3, 0.0), Vec2::new(0.4, 2.0));
        let enemy = enemy_at(0.0, Facing::Right);
        let player = player_at(Vec2::new(0.7, 0.5));

        assert_eq!(
            verdict(&enemy, &player, &world),
            AttackVerdict::Denied(DenyReason::LineOfSightBlocked)
        );

        let config = CombatConfig {
            line_of_sight_check: false,
            ..CombatConfig::default()
        };
        assert_eq!(
            validate_enemy_attack(&enemy, Some(&player), &world, &config),
            AttackVerdict::Hit
        );
    }

    #[test]
    fn test_horizontal_clearance_and_facing() {
        let world = ArenaWorld::flat(0.0, 50.0);

        // |dx| = 0.9 > 1.0 × 0.8, но distance ≤ 1.0
        let enemy = enemy_at(0.0, Facing::Right);
        let player = player_at(Vec2::new(0.9, 0.5));
        assert_eq!(
            verdict(&enemy, &player, &world),
            AttackVerdict::Denied(DenyReason::HorizontalClearance)
        );

        let enemy = enemy_at(0.0, Facing::Left);
        let player = player_at(Vec2::new(0.5, 0.5));
        assert_eq!(verdict(&enemy, &player, &world), AttackVerdict::Denied(DenyReason::FacingAway));
    }
}

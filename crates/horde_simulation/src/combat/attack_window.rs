//! Player → Enemy melee swing (AttackWindow)
//!
//! Swing = `window_total` секунд `is_attacking`; из них первые
//! `window_active` окно наносит урон. Окно: прямоугольник, привязанный к
//! игроку со смещением, зеркалящимся по facing; re-anchor каждый tick.
//!
//! Hit-once: `hit_entities` на commit, повторные overlap'ы того же врага
//! в том же swing'е урона не дают.

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::components::{AgentId, Facing};
use crate::context::SimContext;
use crate::physics::LAYER_ENEMY;
use crate::registry::AgentRegistry;
use crate::schedule::{TimerAction, TimerOwner};

use super::damage::damage_enemy;

/// Transient hit geometry of one committed swing.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackWindow {
    pub owner: AgentId,
    pub commit: u32,
    /// Right-facing offset from the owner position
    pub offset: Vec2,
    pub half_extents: Vec2,
    /// World-space center, обновляется при каждом re-anchor
    pub center: Vec2,
    pub active: bool,
    pub damage: i32,
    /// Agents already damaged by this commit
    pub hit_entities: BTreeSet<AgentId>,
}

impl AttackWindow {
    /// Re-anchors the window to the owner's position and facing.
    pub fn anchor(&mut self, owner_position: Vec2, facing: Facing) {
        self.center = owner_position + facing.mirror(self.offset);
    }

    /// Circle (center, radius) overlaps the rectangle.
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let delta = (center - self.center).abs();
        delta.x <= self.half_extents.x + radius && delta.y <= self.half_extents.y + radius
    }

    /// Broadphase radius (half-diagonal).
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents.length()
    }
}

/// Open swing windows, one per owner.
#[derive(Resource, Debug, Default)]
pub struct AttackWindows {
    windows: BTreeMap<AgentId, AttackWindow>,
    next_commit: u32,
}

impl AttackWindows {
    /// Opens (replacing any previous) window for `owner`; returns its commit number.
    pub fn open(&mut self, owner: AgentId, offset: Vec2, half_extents: Vec2, damage: i32) -> u32 {
        let commit = self.next_commit;
        self.next_commit += 1;
        self.windows.insert(
            owner,
            AttackWindow {
                owner,
                commit,
                offset,
                half_extents,
                center: Vec2::ZERO,
                active: true,
                damage,
                hit_entities: BTreeSet::new(),
            },
        );
        commit
    }

    /// Closes the window if `commit` is still the owner's current one.
    pub fn close(&mut self, owner: AgentId, commit: u32) {
        if self.windows.get(&owner).is_some_and(|w| w.commit == commit) {
            self.windows.remove(&owner);
        }
    }

    pub fn get(&self, owner: AgentId) -> Option<&AttackWindow> {
        self.windows.get(&owner)
    }

    pub fn is_active(&self, owner: AgentId) -> bool {
        self.windows.get(&owner).is_some_and(|w| w.active)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Starts a player swing. Ignored while a swing is in progress or the player is dead.
///
/// Returns the window commit number.
pub fn start_player_attack(ctx: &mut SimContext, windows: &mut AttackWindows) -> Option<u32> {
    let player = ctx.registry.live_player()?;
    if player.is_attacking {
        return None;
    }
    let (owner, damage) = (player.id, player.attack_damage);

    let config = &ctx.config.player;
    let commit = windows.open(owner, config.window_offset(), config.window_half_extents(), damage);
    if let Some(player) = ctx.registry.player_mut() {
        player.is_attacking = true;
    }

    let timer_owner = TimerOwner::Agent(owner);
    ctx.timers.schedule(
        timer_owner,
        ctx.now + config.window_active,
        TimerAction::CloseAttackWindow { owner, commit },
    );
    ctx.timers.schedule(
        timer_owner,
        ctx.now + config.window_total,
        TimerAction::ClearPlayerAttack(owner),
    );

    Some(commit)
}

/// One hit-detection pass over every active window.
pub fn process_attack_windows(ctx: &mut SimContext, windows: &mut AttackWindows) {
    // Владелец умер/пропал → окно закрывается без урона
    windows
        .windows
        .retain(|owner, _| owner_anchor(ctx.registry, *owner).is_some());

    for window in windows.windows.values_mut().filter(|w| w.active) {
        let Some((position, facing)) = owner_anchor(ctx.registry, window.owner) else {
            continue;
        };
        window.anchor(position, facing);

        let candidates = ctx
            .spatial
            .overlap_circle(window.center, window.bounding_radius(), LAYER_ENEMY);

        for target in candidates {
            if target == window.owner || window.hit_entities.contains(&target) {
                continue;
            }
            // Narrowphase по позиции из registry (provider может отставать на tick)
            let Some(enemy) = ctx.registry.enemy(target).filter(|e| !e.is_dead()) else {
                continue;
            };
            if !window.overlaps_circle(enemy.position, enemy.stats.body_radius) {
                continue;
            }

            window.hit_entities.insert(target);
            damage_enemy(ctx, window.owner, target, window.damage, facing.sign());
        }
    }
}

/// Owner position + facing if the owner is the live player.
fn owner_anchor(registry: &AgentRegistry, owner: AgentId) -> Option<(Vec2, Facing)> {
    registry
        .live_player()
        .filter(|p| p.id == owner)
        .map(|p| (p.position, p.facing))
}

/// Timer: end of the whole swing.
pub fn clear_player_attack(registry: &mut AgentRegistry, player: AgentId) {
    if let Some(p) = registry.player_mut().filter(|p| p.id == player) {
        p.is_attacking = false;
    }
}

/// Timer: post-hit immunity expired.
pub fn clear_player_immunity(registry: &mut AgentRegistry, player: AgentId) {
    if let Some(p) = registry.player_mut().filter(|p| p.id == player) {
        p.is_immune = false;
    }
}

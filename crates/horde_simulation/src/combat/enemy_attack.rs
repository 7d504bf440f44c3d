//! Enemy → Player committed attack
//!
//! Commit → (resolve_delay) → re-validate → damage или denial.
//! Backup timer снимает флаг атаки через `attack_clear_delay` после commit'а
//! при любом исходе, так что враг не может застрять в Attacking.

use crate::components::{AgentId, AttackCommit};
use crate::context::SimContext;
use crate::logger;
use crate::registry::AgentRegistry;
use crate::schedule::{TimerAction, TimerOwner};

use super::damage::damage_player;
use super::events::{AttackResolved, AttackVerdict};
use super::validation::validate_enemy_attack;

/// Commits an attack irrevocably; returns the commit number.
///
/// No-op (None) for stale/dead enemies or while another commit is in flight.
pub fn commit_enemy_attack(ctx: &mut SimContext, id: AgentId) -> Option<u32> {
    let enemy = ctx.registry.enemy_mut(id).filter(|e| !e.is_dead() && !e.is_attacking())?;

    let commit = enemy.attack_commits;
    enemy.attack_commits += 1;
    enemy.attack = Some(AttackCommit {
        commit,
        committed_at: ctx.now,
    });
    enemy.last_attack_time = Some(ctx.now);

    let owner = TimerOwner::Agent(id);
    let combat = &ctx.config.combat;
    ctx.timers.schedule(
        owner,
        ctx.now + combat.attack_resolve_delay,
        TimerAction::ResolveEnemyAttack { enemy: id, commit },
    );
    ctx.timers.schedule(
        owner,
        ctx.now + combat.attack_clear_delay,
        TimerAction::ClearEnemyAttack { enemy: id, commit },
    );

    Some(commit)
}

/// Resolve timer: re-validate at resolve time, apply damage at most once.
pub fn resolve_enemy_attack(ctx: &mut SimContext, id: AgentId, commit: u32) {
    let Some(enemy) = ctx
        .registry
        .enemy(id)
        .filter(|e| !e.is_dead() && e.is_current_commit(commit))
    else {
        return;
    };

    let verdict = validate_enemy_attack(enemy, ctx.registry.player(), ctx.spatial, &ctx.config.combat);
    let damage = enemy.stats.damage;

    // Один commit = один resolve; флаг снимается при любом исходе
    clear_enemy_attack(ctx.registry, id, commit);

    if verdict == AttackVerdict::Hit {
        logger::log(&format!("⚔️ Enemy {} hits player for {}", id, damage));
        damage_player(ctx, id, damage);
    }

    ctx.outbox.resolved.push(AttackResolved { enemy: id, verdict });
}

/// Clears the attacking flag if `commit` is still the attack in flight.
pub fn clear_enemy_attack(registry: &mut AgentRegistry, id: AgentId, commit: u32) {
    if let Some(enemy) = registry.enemy_mut(id).filter(|e| e.is_current_commit(commit)) {
        enemy.attack = None;
    }
}

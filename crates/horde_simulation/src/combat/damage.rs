//! Damage application, death, despawn
//!
//! Единственный путь урона: `Damageable::apply_damage` через registry.
//! Смерть отменяет все timers владельца (cancel-on-destroy) и ставит
//! death-fade; despawn удаляет запись и уведомляет spawner.

use crate::ai::enter_knockback;
use crate::components::AgentId;
use crate::context::SimContext;
use crate::logger;
use crate::physics::Damageable;
use crate::schedule::{TimerAction, TimerOwner};
use crate::spawner::SpawnerState;

use super::events::{DamageDealt, EnemyDespawned, EntityDied};

/// Player → enemy hit: damage, then knockback (или смерть).
///
/// `push_direction`: знак толчка (facing атакующего). Stale/dead target → no effect.
pub fn damage_enemy(ctx: &mut SimContext, attacker: AgentId, target: AgentId, amount: i32, push_direction: f32) {
    let Some(outcome) = ctx
        .registry
        .enemy_mut(target)
        .filter(|e| !e.is_dead())
        .map(|e| e.apply_damage(amount))
    else {
        return;
    };

    ctx.outbox.damage.push(DamageDealt {
        attacker,
        target,
        amount: outcome.applied,
        target_died: outcome.died,
    });

    if outcome.died {
        mark_enemy_dead(ctx, target, Some(attacker));
    } else {
        enter_knockback(ctx.registry, target, push_direction, &ctx.config.combat, ctx.now);
    }
}

/// Enemy → player hit: damage + time-boxed immunity.
pub fn damage_player(ctx: &mut SimContext, attacker: AgentId, amount: i32) {
    let Some(player_id) = ctx.registry.live_player().map(|p| p.id) else {
        return;
    };
    let Some(outcome) = ctx.registry.apply_damage(player_id, amount) else {
        return;
    };

    ctx.outbox.damage.push(DamageDealt {
        attacker,
        target: player_id,
        amount: outcome.applied,
        target_died: outcome.died,
    });

    if outcome.died {
        ctx.timers.cancel_owner(TimerOwner::Agent(player_id));
        ctx.outbox.died.push(EntityDied {
            entity: player_id,
            killer: Some(attacker),
        });
        logger::log_info(&format!("💀 Player {} killed by {}", player_id, attacker));
        return;
    }

    let immunity = ctx.config.player.immunity_duration;
    if immunity > 0.0 {
        if let Some(player) = ctx.registry.player_mut() {
            player.is_immune = true;
        }
        ctx.timers.schedule(
            TimerOwner::Agent(player_id),
            ctx.now + immunity,
            TimerAction::ClearPlayerImmunity(player_id),
        );
    }
}

/// Transition to Dead: zero velocity, cancel owned timers, start death fade.
///
/// Idempotent: повторный вызов для уже обработанной смерти ничего не делает.
pub fn mark_enemy_dead(ctx: &mut SimContext, id: AgentId, killer: Option<AgentId>) {
    let Some(enemy) = ctx.registry.enemy_mut(id) else {
        return;
    };
    if enemy.died_at.is_some() {
        return;
    }

    enemy.mark_dead();
    enemy.health.current = 0;
    enemy.died_at = Some(ctx.now);

    // Pending resolve/clear этого врага больше не должны сработать
    ctx.timers.cancel_owner(TimerOwner::Agent(id));
    ctx.timers.schedule(
        TimerOwner::Agent(id),
        ctx.now + ctx.config.enemy.death_fade,
        TimerAction::DespawnEnemy(id),
    );

    ctx.outbox.died.push(EntityDied { entity: id, killer });
    logger::log_info(&format!("💀 Enemy {} died (killer: {:?})", id, killer));
}

/// Death fade elapsed: remove from registry, drop timers, update spawner accounting.
pub fn despawn_enemy(ctx: &mut SimContext, spawner: &mut SpawnerState, id: AgentId) {
    ctx.timers.cancel_owner(TimerOwner::Agent(id));
    spawner.forget(id);

    if ctx.registry.remove_enemy(id).is_some() {
        ctx.outbox.despawned.push(EnemyDespawned { id });
        logger::log(&format!("Enemy {} despawned", id));
    }
}

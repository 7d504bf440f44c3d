//! Scheduled timers: pending action against an absolute deadline.
//!
//! Заменяет "корутинные" ожидания (attack delay, death fade, knockback,
//! spawn pacing). Timer принадлежит owner'у; смерть/despawn owner'а
//! отменяет все его timers (`cancel_owner`), поэтому despawned id никогда
//! не становится целью позже сработавшего timer'а.

use bevy::prelude::*;
use std::cmp::Ordering;

use crate::components::AgentId;

/// Кому принадлежит timer (для cancel-on-destroy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Agent(AgentId),
    Spawner,
}

/// What happens when the deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Re-validate and apply a committed enemy attack
    ResolveEnemyAttack { enemy: AgentId, commit: u32 },
    /// Backup clear of the enemy "attacking" flag
    ClearEnemyAttack { enemy: AgentId, commit: u32 },
    /// Death fade elapsed → remove from registry
    DespawnEnemy(AgentId),
    /// End of the active part of a player swing
    CloseAttackWindow { owner: AgentId, commit: u32 },
    /// End of the whole player swing
    ClearPlayerAttack(AgentId),
    ClearPlayerImmunity(AgentId),
    /// Next paced placement of the current spawn batch
    SpawnNext,
    /// Periodic population check
    RespawnCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTimer {
    pub handle: TimerHandle,
    pub owner: TimerOwner,
    pub deadline: f32,
    pub action: TimerAction,
}

impl ScheduledTimer {
    /// Fire order: deadline, затем порядок регистрации.
    fn fire_order(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.handle.cmp(&other.handle))
    }
}

#[derive(Resource, Debug, Default)]
pub struct TimerQueue {
    pending: Vec<ScheduledTimer>,
    next_handle: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: TimerOwner, deadline: f32, action: TimerAction) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(ScheduledTimer {
            handle,
            owner,
            deadline,
            action,
        });
        handle
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }

    /// Drops every pending timer of `owner`; returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.owner != owner);
        before - self.pending.len()
    }

    /// Removes and returns the earliest timer with `deadline ≤ now`.
    pub fn pop_due(&mut self, now: f32) -> Option<ScheduledTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by(|(_, a), (_, b)| a.fire_order(b))
            .map(|(i, _)| i)?;

        Some(self.pending.swap_remove(index))
    }

    pub fn pending_for(&self, owner: TimerOwner) -> impl Iterator<Item = &ScheduledTimer> {
        self.pending.iter().filter(move |t| t.owner == owner)
    }

    pub fn has_pending(&self, owner: TimerOwner, action: TimerAction) -> bool {
        self.pending_for(owner).any(|t| t.action == action)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

//! Fixed-tick simulation clock.

use bevy::prelude::*;
use std::time::Duration;

/// Шаг считается изменённым, только если `Time<Fixed>` разошёлся больше чем на это
const STEP_TOLERANCE: f32 = 1e-6;

/// Логическое время симуляции: `now = origin + tick × step`.
///
/// Не зависит от wall clock и `Time<Fixed>` accumulator'а → одинаковые
/// deadlines при ручном `run_schedule(FixedUpdate)` в тестах. Шаг берётся
/// из `Time<Fixed>`; если хост меняет timestep, отсчёт продолжается с
/// текущего `now` уже с новым шагом.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    pub tick: u64,
    pub step: f32,
    /// Время на момент последней смены шага
    pub origin: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::from_hz(60.0)
    }
}

impl SimClock {
    pub fn from_hz(hz: f32) -> Self {
        Self {
            tick: 0,
            step: 1.0 / hz.max(1.0),
            origin: 0.0,
        }
    }

    /// Seconds since start (f64 внутри, чтобы не копить ошибку сложения).
    pub fn now(&self) -> f32 {
        self.now_f64() as f32
    }

    fn now_f64(&self) -> f64 {
        self.origin + self.tick as f64 * self.step as f64
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Переходит на новый шаг, не трогая уже прошедшее время.
    pub fn rebase(&mut self, step: f32) {
        if step <= 0.0 || (step - self.step).abs() <= STEP_TOLERANCE {
            return;
        }
        self.origin = self.now_f64();
        self.tick = 0;
        self.step = step;
    }

    /// `rebase` по timestep'у `Time<Fixed>`.
    pub fn follow_timestep(&mut self, timestep: Duration) {
        self.rebase(timestep.as_secs_f32());
    }
}

/// System: один tick на каждый прогон FixedUpdate (шаг: текущий `Time<Fixed>`).
pub fn advance_clock(mut clock: ResMut<SimClock>, time: Res<Time<Fixed>>) {
    clock.follow_timestep(time.timestep());
    clock.advance();
}

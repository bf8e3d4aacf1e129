use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::PhaseConfig;
use crate::hardware::{CounterMode, DeadtimeMode, DutyMode, Operator, PwmHardware, TimerConfig};
use crate::sine_table::SineTable;

/// "Duty update pending" handoff between the completion interrupt and the foreground loop.
///
/// The interrupt side only ever sets it, the foreground only ever takes it.
/// Marks that arrive before the foreground takes the flag coalesce into one.
#[derive(Debug, Default)]
pub struct PendingFlag(AtomicBool);

impl PendingFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline(always)]
    pub fn mark_dirty(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read and clear in one step.
    #[inline(always)]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Acquire)
    }

    #[inline(always)]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One inverter leg walking the shared sine table.
pub struct PhaseChannel<'a, const N: usize> {
    config: PhaseConfig,
    table: &'a SineTable<N>,
    pending: &'a PendingFlag,
    cursor: usize,
    last_duty: f32,
}

impl<'a, const N: usize> PhaseChannel<'a, N> {
    /// `offset` is the starting cursor, reduced modulo the table length.
    pub fn new(config: PhaseConfig, table: &'a SineTable<N>, pending: &'a PendingFlag, offset: usize) -> Self {
        Self {
            config,
            table,
            pending,
            cursor: offset % N,
            last_duty: 0.0,
        }
    }

    /// Configure the timer, wire both outputs with dead-time and start switching.
    pub fn init<P: PwmHardware>(&mut self, pwm: &mut P, carrier_hz: u32) {
        let PhaseConfig { unit, timer, .. } = self.config;
        let dead_time = self.config.dead_time;

        pwm.bind_pin(unit, self.config.high, self.config.high_pin);
        pwm.bind_pin(unit, self.config.low, self.config.low_pin);
        pwm.configure(
            unit,
            timer,
            &TimerConfig {
                carrier_hz,
                duty_a: 0.0,
                duty_b: 0.0,
                counter_mode: CounterMode::Up,
                duty_mode: DutyMode::ActiveHigh,
            },
        );
        pwm.enable_deadtime(
            unit,
            timer,
            DeadtimeMode::ActiveHighComplement,
            dead_time.rising,
            dead_time.falling,
        );
        pwm.enable_period_interrupt(unit, timer);
        pwm.start(unit, timer);
        self.last_duty = 0.0;

        info!(
            "phase on timer {} started: high {}{} low {}{} dead-time {}/{} carrier {}Hz",
            timer.0,
            self.config.high_pin.port(),
            self.config.high_pin.number(),
            self.config.low_pin.port(),
            self.config.low_pin.number(),
            dead_time.rising,
            dead_time.falling,
            carrier_hz
        );
    }

    /// Safe from interrupt context.
    #[inline(always)]
    pub fn mark_dirty(&self) {
        self.pending.mark_dirty();
    }

    /// Push the next table step to the high-side operator if a period completed.
    ///
    /// Returns the duty written, or `None` when nothing was pending.
    pub fn apply_pending_update<P: PwmHardware>(&mut self, pwm: &mut P, scale: f32) -> Option<f32> {
        if !self.pending.take() {
            return None;
        }

        let duty = self.table.scaled_duty(self.cursor, scale);
        pwm.set_duty(self.config.unit, self.config.timer, Operator::A, duty);
        self.last_duty = duty;

        self.cursor += 1;
        if self.cursor >= N {
            self.cursor = 0;
        }
        Some(duty)
    }

    pub fn set_carrier_frequency<P: PwmHardware>(&mut self, pwm: &mut P, hz: u32) {
        pwm.set_frequency(self.config.unit, self.config.timer, hz);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_duty(&self) -> f32 {
        self.last_duty
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_set()
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    pub(crate) fn pending_flag(&self) -> &'a PendingFlag {
        self.pending
    }
}

use crate::completion::CycleCompletionHandler;
use crate::config::{clamp_ratio, ConfigError, InverterConfig};
use crate::hardware::{PwmHardware, UnitId};
use crate::phase::{PendingFlag, PhaseChannel};
use crate::sine_table::SineTable;

/// Three legs sharing one sine table, one amplitude scale and one output frequency.
pub struct Inverter<'a, const N: usize> {
    unit: UnitId,
    config: InverterConfig,
    phases: [PhaseChannel<'a, N>; 3],
    scale: f32,
    electrical_hz: f32,
    carrier_hz: u32,
}

impl<'a, const N: usize> Inverter<'a, N> {
    /// Legs start at cursors 0, N/3 and 2N/3, with zero amplitude at the lowest frequency.
    pub fn new(
        config: InverterConfig,
        table: &'a SineTable<N>,
        flags: &'a [PendingFlag; 3],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let phases = [0, 1, 2].map(|k| PhaseChannel::new(config.phases[k], table, &flags[k], k * N / 3));

        Ok(Self {
            unit: config.unit,
            config,
            phases,
            scale: 0.0,
            electrical_hz: config.frequency.electrical_hz(0.0),
            carrier_hz: config.frequency.carrier_hz(0.0, N),
        })
    }

    /// Start all three legs and hand back the handler for the unit's interrupt.
    pub fn init<P: PwmHardware>(&mut self, pwm: &mut P) -> CycleCompletionHandler<'a> {
        for phase in self.phases.iter_mut() {
            phase.init(pwm, self.carrier_hz);
        }
        pwm.register_interrupt_handler(self.unit);

        info!(
            "inverter up: {} legs, {}..{}Hz output",
            self.phases.len(),
            self.config.frequency.min_hz,
            self.config.frequency.max_hz
        );

        CycleCompletionHandler::new(
            self.unit,
            [0, 1, 2].map(|k| (self.phases[k].config().timer, self.phases[k].pending_flag())),
        )
    }

    /// Apply a normalized potentiometer reading to amplitude and output frequency.
    pub fn update_frequency_and_scale<P: PwmHardware>(&mut self, sample_ratio: f32, pwm: &mut P) {
        let ratio = clamp_ratio(sample_ratio);
        self.scale = ratio;
        self.electrical_hz = self.config.frequency.electrical_hz(ratio);
        self.carrier_hz = self.config.frequency.carrier_hz(ratio, N);

        for phase in self.phases.iter_mut() {
            phase.set_carrier_frequency(pwm, self.carrier_hz);
        }

        debug!(
            "scale {} output {}Hz carrier {}Hz",
            self.scale, self.electrical_hz, self.carrier_hz
        );
    }

    /// Foreground loop body: service every leg whose period completed.
    pub fn service<P: PwmHardware>(&mut self, pwm: &mut P) {
        let scale = self.scale;
        for phase in self.phases.iter_mut() {
            phase.apply_pending_update(pwm, scale);
        }
    }

    /// Lock-free check used to skip idle loop iterations.
    pub fn has_pending(&self) -> bool {
        self.phases.iter().any(|phase| phase.is_pending())
    }

    pub fn phase(&self, index: usize) -> &PhaseChannel<'a, N> {
        &self.phases[index]
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn electrical_hz(&self) -> f32 {
        self.electrical_hz
    }

    pub fn carrier_hz(&self) -> u32 {
        self.carrier_hz
    }
}

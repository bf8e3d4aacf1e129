use crate::config::{AnalogConfig, ConfigError};
use crate::hardware::{AnalogInput, PwmHardware};
use crate::inverter::Inverter;

/// Time-gated potentiometer sampling feeding the inverter's frequency/amplitude law.
///
/// Timestamps are microseconds from a free-running 32-bit clock; elapsed time
/// is taken with wrapping arithmetic so the counter may roll over.
pub struct AnalogScaler {
    config: AnalogConfig,
    max_raw: u16,
    last_sample_us: u32,
    last_ratio: Option<f32>,
}

impl AnalogScaler {
    /// The first sample is taken one period after `now_us`.
    pub fn new(config: AnalogConfig, now_us: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            max_raw: config.max_raw(),
            last_sample_us: now_us,
            last_ratio: None,
        })
    }

    pub fn init<A: AnalogInput>(&mut self, adc: &mut A) {
        adc.configure_resolution(self.config.resolution_bits);
        adc.configure_input_range(self.config.channel, self.config.attenuation);
    }

    #[inline]
    pub fn is_due(&self, now_us: u32) -> bool {
        now_us.wrapping_sub(self.last_sample_us) > self.config.sample_period_us
    }

    /// Raw conversion to `[0, 1]`.
    pub fn normalize(&self, raw: u16) -> f32 {
        raw.min(self.max_raw) as f32 / self.max_raw as f32
    }

    /// One foreground iteration: sample and rescale the inverter if the period has elapsed.
    ///
    /// Returns the ratio applied, if a sample was taken.
    pub fn poll<A, P, const N: usize>(
        &mut self,
        now_us: u32,
        adc: &mut A,
        inverter: &mut Inverter<'_, N>,
        pwm: &mut P,
    ) -> Option<f32>
    where
        A: AnalogInput,
        P: PwmHardware,
    {
        if !self.is_due(now_us) {
            return None;
        }
        self.last_sample_us = now_us;

        let ratio = self.normalize(adc.read_raw(self.config.channel));
        self.last_ratio = Some(ratio);
        inverter.update_frequency_and_scale(ratio, pwm);
        Some(ratio)
    }

    pub fn last_ratio(&self) -> Option<f32> {
        self.last_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeadTime, FrequencyRange, InverterConfig, SAMPLE_PERIOD_US};
    use crate::hardware::mock::{MockAdc, MockPwm};
    use crate::hardware::{Attenuation, PinId, TimerId, UnitId};
    use crate::phase::PendingFlag;
    use crate::sine_table::SINE_TABLE;

    fn flags() -> [PendingFlag; 3] {
        [PendingFlag::new(), PendingFlag::new(), PendingFlag::new()]
    }

    fn inverter(flags: &[PendingFlag; 3]) -> Inverter<'_, 33> {
        let config = InverterConfig::three_phase(
            UnitId(0),
            [
                (PinId::new('A', 8), PinId::new('B', 13)),
                (PinId::new('A', 9), PinId::new('B', 14)),
                (PinId::new('A', 10), PinId::new('B', 15)),
            ],
            DeadTime::DEFAULT,
            FrequencyRange::DEFAULT,
        );
        Inverter::new(config, &SINE_TABLE, flags).unwrap()
    }

    #[test]
    fn test_init_configures_adc() {
        let mut scaler = AnalogScaler::new(AnalogConfig::new(3), 0).unwrap();
        let mut adc = MockAdc::default();
        scaler.init(&mut adc);
        assert_eq!(adc.resolution, Some(12));
        assert_eq!(adc.range, Some((3, Attenuation::Db11)));
    }

    #[test]
    fn test_samples_only_after_period() {
        let flags = flags();
        let mut inverter = inverter(&flags);
        let mut pwm = MockPwm::default();
        let mut adc = MockAdc::with_readings(&[4095, 0]);
        let mut scaler = AnalogScaler::new(AnalogConfig::new(0), 1_000).unwrap();

        assert_eq!(scaler.poll(1_000 + SAMPLE_PERIOD_US, &mut adc, &mut inverter, &mut pwm), None);
        assert_eq!(adc.reads, 0);

        let t = 1_001 + SAMPLE_PERIOD_US;
        assert_eq!(scaler.poll(t, &mut adc, &mut inverter, &mut pwm), Some(1.0));
        assert_eq!(inverter.scale(), 1.0);
        assert_eq!(inverter.electrical_hz(), 60.0);

        // Gate restarts from the sample just taken.
        assert_eq!(scaler.poll(t + 10, &mut adc, &mut inverter, &mut pwm), None);
        assert_eq!(adc.reads, 1);
        assert_eq!(scaler.last_ratio(), Some(1.0));
    }

    #[test]
    fn test_half_scale_reading() {
        let flags = flags();
        let mut inverter = inverter(&flags);
        let mut pwm = MockPwm::default();
        let mut adc = MockAdc::with_readings(&[2048]);
        let mut scaler = AnalogScaler::new(AnalogConfig::new(0), 0).unwrap();

        let ratio = scaler.poll(SAMPLE_PERIOD_US + 1, &mut adc, &mut inverter, &mut pwm).unwrap();
        assert!((ratio - 0.5).abs() < 1e-3);
        assert!((inverter.electrical_hz() - 50.0).abs() < 0.02);
        assert_eq!(pwm.frequencies(TimerId(1)), vec![inverter.carrier_hz()]);
    }

    #[test]
    fn test_gate_survives_clock_wrap() {
        let start = u32::MAX - 100;
        let scaler = AnalogScaler::new(AnalogConfig::new(0), start).unwrap();
        assert!(!scaler.is_due(start.wrapping_add(SAMPLE_PERIOD_US)));
        assert!(scaler.is_due(start.wrapping_add(SAMPLE_PERIOD_US + 1)));
    }

    #[test]
    fn test_normalize_saturates() {
        let scaler = AnalogScaler::new(AnalogConfig::new(0), 0).unwrap();
        assert_eq!(scaler.normalize(0), 0.0);
        assert_eq!(scaler.normalize(4095), 1.0);
        assert_eq!(scaler.normalize(u16::MAX), 1.0);
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let config = AnalogConfig { resolution_bits: 0, ..AnalogConfig::new(0) };
        assert!(matches!(AnalogScaler::new(config, 0), Err(ConfigError::InvalidResolution(0))));
    }
}

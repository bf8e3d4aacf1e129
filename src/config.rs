use core::fmt;

use crate::hardware::{Attenuation, PinId, PwmSignal, TimerId, UnitId};

/// Entries in the modulation table, one electrical cycle.
pub const TABLE_LEN: usize = 33;

pub const MIN_FREQ_HZ: f32 = 40.0;
pub const MAX_FREQ_HZ: f32 = 60.0;

/// Dead-time delays in timer ticks.
pub const DEAD_TIME_RISING: u16 = 100;
pub const DEAD_TIME_FALLING: u16 = 100;

pub const SAMPLE_PERIOD_US: u32 = 1_000_000;
pub const ADC_RESOLUTION_BITS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Bounds are not finite, not positive, or out of order.
    InvalidFrequencyRange,
    /// Two legs were given the same timer.
    DuplicateTimer(TimerId),
    /// A leg sits on another unit, or its signals belong to another timer.
    UnitMismatch(TimerId),
    InvalidResolution(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFrequencyRange => write!(f, "invalid output frequency range"),
            ConfigError::DuplicateTimer(timer) => write!(f, "timer {} used by two phases", timer.0),
            ConfigError::UnitMismatch(timer) => {
                write!(f, "phase on timer {} is not wired to the inverter unit", timer.0)
            }
            ConfigError::InvalidResolution(bits) => write!(f, "unsupported ADC resolution: {bits} bits"),
        }
    }
}

/// Bounds of the synthesized electrical frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyRange {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl FrequencyRange {
    pub const DEFAULT: Self = Self {
        min_hz: MIN_FREQ_HZ,
        max_hz: MAX_FREQ_HZ,
    };

    /// Linear interpolation between the bounds. `ratio` is clamped to `[0, 1]`, NaN reads as 0.
    pub fn electrical_hz(&self, ratio: f32) -> f32 {
        self.min_hz + (self.max_hz - self.min_hz) * clamp_ratio(ratio)
    }

    /// Carrier that walks a `table_len` table exactly once per electrical cycle.
    pub fn carrier_hz(&self, ratio: f32, table_len: usize) -> u32 {
        (self.electrical_hz(ratio) * table_len as f32 + 0.5) as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.min_hz > 0.0 && self.min_hz <= self.max_hz;
        if !ordered || !self.max_hz.is_finite() {
            return Err(ConfigError::InvalidFrequencyRange);
        }
        Ok(())
    }
}

pub(crate) fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeadTime {
    pub rising: u16,
    pub falling: u16,
}

impl DeadTime {
    pub const DEFAULT: Self = Self {
        rising: DEAD_TIME_RISING,
        falling: DEAD_TIME_FALLING,
    };
}

/// Wiring of one inverter leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseConfig {
    pub unit: UnitId,
    pub timer: TimerId,
    pub high: PwmSignal,
    pub low: PwmSignal,
    pub high_pin: PinId,
    pub low_pin: PinId,
    pub dead_time: DeadTime,
}

impl PhaseConfig {
    pub const fn new(unit: UnitId, timer: TimerId, pins: (PinId, PinId), dead_time: DeadTime) -> Self {
        Self {
            unit,
            timer,
            high: PwmSignal::high(timer),
            low: PwmSignal::low(timer),
            high_pin: pins.0,
            low_pin: pins.1,
            dead_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InverterConfig {
    pub unit: UnitId,
    pub phases: [PhaseConfig; 3],
    pub frequency: FrequencyRange,
}

impl InverterConfig {
    /// Phase `k` runs on timer `k` of `unit`, high/low pins taken from `pins[k]`.
    pub const fn three_phase(
        unit: UnitId,
        pins: [(PinId, PinId); 3],
        dead_time: DeadTime,
        frequency: FrequencyRange,
    ) -> Self {
        Self {
            unit,
            phases: [
                PhaseConfig::new(unit, TimerId(0), pins[0], dead_time),
                PhaseConfig::new(unit, TimerId(1), pins[1], dead_time),
                PhaseConfig::new(unit, TimerId(2), pins[2], dead_time),
            ],
            frequency,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frequency.validate()?;
        for (i, phase) in self.phases.iter().enumerate() {
            let wired = phase.unit == self.unit
                && phase.high.timer == phase.timer
                && phase.low.timer == phase.timer;
            if !wired {
                return Err(ConfigError::UnitMismatch(phase.timer));
            }
            if self.phases[..i].iter().any(|other| other.timer == phase.timer) {
                return Err(ConfigError::DuplicateTimer(phase.timer));
            }
        }
        Ok(())
    }
}

/// Potentiometer channel and sampling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogConfig {
    pub channel: u8,
    pub resolution_bits: u8,
    pub attenuation: Attenuation,
    pub sample_period_us: u32,
}

impl AnalogConfig {
    pub const fn new(channel: u8) -> Self {
        Self {
            channel,
            resolution_bits: ADC_RESOLUTION_BITS,
            attenuation: Attenuation::Db11,
            sample_period_us: SAMPLE_PERIOD_US,
        }
    }

    /// Largest raw conversion at the configured resolution.
    pub const fn max_raw(&self) -> u16 {
        ((1u32 << self.resolution_bits) - 1) as u16
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.resolution_bits {
            1..=16 => Ok(()),
            bits => Err(ConfigError::InvalidResolution(bits)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins() -> [(PinId, PinId); 3] {
        [
            (PinId::new('A', 8), PinId::new('B', 13)),
            (PinId::new('A', 9), PinId::new('B', 14)),
            (PinId::new('A', 10), PinId::new('B', 15)),
        ]
    }

    #[test]
    fn test_frequency_law_endpoints() {
        let range = FrequencyRange::DEFAULT;
        assert_eq!(range.electrical_hz(0.0), 40.0);
        assert_eq!(range.electrical_hz(1.0), 60.0);
        assert_eq!(range.electrical_hz(0.5), 50.0);
        assert_eq!(range.carrier_hz(0.5, TABLE_LEN), 1650);
        assert_eq!(range.carrier_hz(0.0, TABLE_LEN), 1320);
        assert_eq!(range.carrier_hz(1.0, TABLE_LEN), 1980);
    }

    #[test]
    fn test_frequency_law_is_monotonic() {
        let range = FrequencyRange::DEFAULT;
        let mut last_electrical = f32::MIN;
        let mut last_carrier = 0;
        for step in 0..=1000 {
            let ratio = step as f32 / 1000.0;
            let electrical = range.electrical_hz(ratio);
            let carrier = range.carrier_hz(ratio, TABLE_LEN);
            assert!(electrical >= last_electrical, "electrical dropped at {ratio}");
            assert!(carrier >= last_carrier, "carrier dropped at {ratio}");
            assert!((MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&electrical));
            last_electrical = electrical;
            last_carrier = carrier;
        }
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        let range = FrequencyRange::DEFAULT;
        assert_eq!(range.electrical_hz(-0.5), MIN_FREQ_HZ);
        assert_eq!(range.electrical_hz(3.0), MAX_FREQ_HZ);
        assert_eq!(range.electrical_hz(f32::NAN), MIN_FREQ_HZ);
    }

    #[test]
    fn test_default_layout_is_valid() {
        let config = InverterConfig::three_phase(UnitId(0), pins(), DeadTime::DEFAULT, FrequencyRange::DEFAULT);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.phases[2].timer, TimerId(2));
        assert_eq!(config.phases[1].low, PwmSignal::low(TimerId(1)));
        assert_eq!(config.phases[0].high_pin, PinId::new('A', 8));
    }

    #[test]
    fn test_rejects_bad_frequency_range() {
        let mut config = InverterConfig::three_phase(UnitId(0), pins(), DeadTime::DEFAULT, FrequencyRange::DEFAULT);
        config.frequency = FrequencyRange { min_hz: 60.0, max_hz: 40.0 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequencyRange));
        config.frequency = FrequencyRange { min_hz: 0.0, max_hz: 40.0 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequencyRange));
        config.frequency = FrequencyRange { min_hz: 40.0, max_hz: f32::INFINITY };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequencyRange));
    }

    #[test]
    fn test_rejects_shared_timer() {
        let mut config = InverterConfig::three_phase(UnitId(0), pins(), DeadTime::DEFAULT, FrequencyRange::DEFAULT);
        config.phases[2] = PhaseConfig::new(UnitId(0), TimerId(0), pins()[2], DeadTime::DEFAULT);
        assert_eq!(config.validate(), Err(ConfigError::DuplicateTimer(TimerId(0))));
    }

    #[test]
    fn test_rejects_foreign_unit() {
        let mut config = InverterConfig::three_phase(UnitId(0), pins(), DeadTime::DEFAULT, FrequencyRange::DEFAULT);
        config.phases[1].unit = UnitId(1);
        assert_eq!(config.validate(), Err(ConfigError::UnitMismatch(TimerId(1))));
    }

    #[test]
    fn test_analog_resolution() {
        let analog = AnalogConfig::new(0);
        assert_eq!(analog.max_raw(), 4095);
        assert_eq!(analog.validate(), Ok(()));
        let wide = AnalogConfig { resolution_bits: 17, ..analog };
        assert_eq!(wide.validate(), Err(ConfigError::InvalidResolution(17)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::DuplicateTimer(TimerId(2)).to_string(),
            "timer 2 used by two phases"
        );
    }
}

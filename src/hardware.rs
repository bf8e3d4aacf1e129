//! Boundary between the modulation engine and the peripherals it drives.
//!
//! The engine never touches registers. Board support implements these traits
//! over its timer and ADC drivers; the calls are treated as infallible.

/// PWM peripheral unit (one interrupt line, several timers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitId(pub u8);

/// Timer inside a unit. Each inverter leg owns one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

/// First status bit used by the per-timer "period elapsed" sources.
const PERIOD_ELAPSED_SHIFT: u8 = 6;

impl TimerId {
    /// Bit of the unit's interrupt status word raised when this timer completes a period.
    pub const fn period_elapsed_bit(self) -> u32 {
        1 << (PERIOD_ELAPSED_SHIFT + self.0)
    }
}

/// Compare operator of a timer. `A` drives the high side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operator {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    High,
    Low,
}

/// Logical PWM output line: one side of one timer's complementary pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmSignal {
    pub timer: TimerId,
    pub side: Side,
}

impl PwmSignal {
    pub const fn high(timer: TimerId) -> Self {
        Self { timer, side: Side::High }
    }

    pub const fn low(timer: TimerId) -> Self {
        Self { timer, side: Side::Low }
    }
}

/// Physical GPIO, encoded as port index in the high nibble and pin number in the low one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub u8);

impl PinId {
    /// `PinId::new('B', 13)` is PB13.
    pub const fn new(port: char, number: u8) -> Self {
        Self((((port as u8) - b'A') << 4) | (number & 0x0F))
    }

    pub const fn port(self) -> char {
        (b'A' + (self.0 >> 4)) as char
    }

    pub const fn number(self) -> u8 {
        self.0 & 0x0F
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterMode {
    Up,
    Down,
    UpDown,
}

/// Output polarity of the compare operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DutyMode {
    ActiveHigh,
    ActiveLow,
}

/// How the low side is derived from the high side when dead-time is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeadtimeMode {
    ActiveHighComplement,
    ActiveLowComplement,
}

/// Timer setup applied once before the timer is started.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    pub carrier_hz: u32,
    pub duty_a: f32,
    pub duty_b: f32,
    pub counter_mode: CounterMode,
    pub duty_mode: DutyMode,
}

/// Input attenuation of an analog channel, selecting its usable voltage span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

pub trait PwmHardware {
    fn configure(&mut self, unit: UnitId, timer: TimerId, config: &TimerConfig);
    fn bind_pin(&mut self, unit: UnitId, signal: PwmSignal, pin: PinId);
    fn enable_deadtime(
        &mut self,
        unit: UnitId,
        timer: TimerId,
        mode: DeadtimeMode,
        rising_delay: u16,
        falling_delay: u16,
    );
    fn enable_period_interrupt(&mut self, unit: UnitId, timer: TimerId);
    /// Route the unit's interrupt line to the cycle completion handler.
    fn register_interrupt_handler(&mut self, unit: UnitId);
    fn start(&mut self, unit: UnitId, timer: TimerId);
    fn set_frequency(&mut self, unit: UnitId, timer: TimerId, hz: u32);
    /// `percent` is in `[0, 100]`.
    fn set_duty(&mut self, unit: UnitId, timer: TimerId, operator: Operator, percent: f32);
}

/// Typed view over a unit's interrupt status and clear registers.
pub trait InterruptStatus {
    fn read_status(&mut self, unit: UnitId) -> u32;
    fn clear(&mut self, unit: UnitId, mask: u32);
}

pub trait AnalogInput {
    fn configure_resolution(&mut self, bits: u8);
    fn configure_input_range(&mut self, channel: u8, attenuation: Attenuation);
    /// Raw conversion in `[0, 2^bits - 1]`.
    fn read_raw(&mut self, channel: u8) -> u16;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_elapsed_bits_follow_timer_index() {
        assert_eq!(TimerId(0).period_elapsed_bit(), 1 << 6);
        assert_eq!(TimerId(1).period_elapsed_bit(), 1 << 7);
        assert_eq!(TimerId(2).period_elapsed_bit(), 1 << 8);
    }

    #[test]
    fn pin_id_encodes_port_and_number() {
        let pin = PinId::new('B', 13);
        assert_eq!(pin.port(), 'B');
        assert_eq!(pin.number(), 13);
        assert_eq!(PinId::new('A', 8).0, 8);
    }
}

use stm32f4xx_hal::{
    gpio::{PA10, PA8, PA9, PB13, PB14, PB15},
    pac::TIM1,
    prelude::*,
    rcc::Clocks,
    timer::{Channel, Channel1, Channel2, Channel3, ChannelBuilder, Event, Flag, PwmHz},
    ClearFlags, ReadFlags,
};
use spwm_inverter::hardware::{
    CounterMode, DeadtimeMode, InterruptStatus, Operator, PinId, PwmHardware, PwmSignal, Side,
    TimerConfig, TimerId, UnitId,
};

pub type Tim1Complementary = PwmHz<
    TIM1,
    (
        ChannelBuilder<TIM1, 0, true>,
        ChannelBuilder<TIM1, 1, true>,
        ChannelBuilder<TIM1, 2, true>,
    ),
>;

/// TIM1 drives all three legs: CHx on the high side, CHxN on the low side.
///
/// The engine's per-leg timers map onto TIM1's channels, so they share one
/// carrier and one update event. An update therefore completes a period on
/// every leg at once.
pub struct InverterBridge {
    pwm: Tim1Complementary,
    carrier_hz: u32,
}

/// Carrier until the engine configures the legs.
const BOOT_CARRIER_HZ: u32 = 1_000;

const ALL_LEGS: u32 =
    TimerId(0).period_elapsed_bit() | TimerId(1).period_elapsed_bit() | TimerId(2).period_elapsed_bit();

fn channel(timer: TimerId) -> Channel {
    match timer.0 {
        0 => Channel::C1,
        1 => Channel::C2,
        _ => Channel::C3,
    }
}

pub fn init(
    tim1: TIM1,
    pins: (PA8, PB13, PA9, PB14, PA10, PB15),
    clocks: &Clocks,
) -> InverterBridge {
    let (pa8, pb13, pa9, pb14, pa10, pb15) = pins;
    let channels = (
        Channel1::new(pa8).with_complementary(pb13),
        Channel2::new(pa9).with_complementary(pb14),
        Channel3::new(pa10).with_complementary(pb15),
    );
    let pwm = tim1.pwm_hz(channels, BOOT_CARRIER_HZ.Hz(), clocks);
    InverterBridge {
        pwm,
        carrier_hz: BOOT_CARRIER_HZ,
    }
}

impl InverterBridge {
    fn duty_ticks(&self, percent: f32) -> u16 {
        let max_duty = self.pwm.get_max_duty();
        (percent.clamp(0.0, 100.0) * max_duty as f32 / 100.0) as u16
    }

    fn set_carrier(&mut self, hz: u32) {
        if hz != self.carrier_hz {
            self.pwm.set_period(hz.Hz());
            self.carrier_hz = hz;
        }
    }
}

impl PwmHardware for InverterBridge {
    fn configure(&mut self, _unit: UnitId, timer: TimerId, config: &TimerConfig) {
        if config.counter_mode != CounterMode::Up {
            defmt::warn!("TIM1 runs edge-aligned, counter mode {} ignored", config.counter_mode);
        }
        self.set_carrier(config.carrier_hz);
        // CHxN is the inverse of CHx, so operator B has no compare of its own.
        let duty = self.duty_ticks(config.duty_a);
        self.pwm.set_duty(channel(timer), duty);
    }

    fn bind_pin(&mut self, _unit: UnitId, signal: PwmSignal, pin: PinId) {
        // Pins are routed when the channel builders take them; only the wiring is logged.
        let side = match signal.side {
            Side::High => "CH",
            Side::Low => "CHN",
        };
        defmt::debug!(
            "TIM1 {}{} on P{}{}",
            side,
            signal.timer.0 + 1,
            pin.port(),
            pin.number()
        );
    }

    fn enable_deadtime(
        &mut self,
        _unit: UnitId,
        _timer: TimerId,
        mode: DeadtimeMode,
        rising_delay: u16,
        falling_delay: u16,
    ) {
        if rising_delay != falling_delay {
            defmt::warn!(
                "TIM1 dead-time is symmetric, using {} for both edges",
                rising_delay.max(falling_delay)
            );
        }
        if mode != DeadtimeMode::ActiveHighComplement {
            defmt::warn!("dead-time mode {} not supported, outputs stay active high", mode);
        }
        self.pwm.set_dead_time(rising_delay.max(falling_delay));
    }

    fn enable_period_interrupt(&mut self, _unit: UnitId, _timer: TimerId) {
        self.pwm.listen(Event::Update);
    }

    fn register_interrupt_handler(&mut self, _unit: UnitId) {
        // TIM1_UP_TIM10 is bound by the RTIC app; drop anything latched during setup.
        self.pwm.clear_flags(Flag::Update);
    }

    fn start(&mut self, _unit: UnitId, timer: TimerId) {
        self.pwm.enable(channel(timer));
        self.pwm.enable_complementary(channel(timer));
    }

    fn set_frequency(&mut self, _unit: UnitId, _timer: TimerId, hz: u32) {
        self.set_carrier(hz);
    }

    fn set_duty(&mut self, _unit: UnitId, timer: TimerId, operator: Operator, percent: f32) {
        if operator == Operator::A {
            let duty = self.duty_ticks(percent);
            self.pwm.set_duty(channel(timer), duty);
        }
    }
}

impl InterruptStatus for InverterBridge {
    fn read_status(&mut self, _unit: UnitId) -> u32 {
        if self.pwm.flags().contains(Flag::Update) {
            ALL_LEGS
        } else {
            0
        }
    }

    fn clear(&mut self, _unit: UnitId, mask: u32) {
        if mask & ALL_LEGS != 0 {
            self.pwm.clear_flags(Flag::Update);
        }
    }
}

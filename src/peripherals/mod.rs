use embedded_hal::digital::StatefulOutputPin;

pub mod potentiometer;
pub mod pwm_driver;

/// Status LED toggled once per potentiometer sample.
pub struct Heartbeat<P: StatefulOutputPin> {
    led: P,
}

impl<P: StatefulOutputPin> Heartbeat<P> {
    pub fn new(mut led: P) -> Self {
        led.set_low().ok();
        Self { led }
    }

    pub fn beat(&mut self) {
        self.led.toggle().ok();
    }
}

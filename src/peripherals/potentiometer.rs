use stm32f4xx_hal::{
    adc::{
        config::{AdcConfig, Resolution, SampleTime},
        Adc,
    },
    gpio::{Analog, PA0},
    pac::ADC1,
};
use spwm_inverter::hardware::{AnalogInput, Attenuation};

/// Speed/amplitude knob on PA0 (ADC1 IN0).
pub struct Potentiometer {
    adc: Adc<ADC1>,
    pin: PA0<Analog>,
    sample_time: SampleTime,
}

impl Potentiometer {
    pub fn new(adc1: ADC1, pin: PA0<Analog>) -> Self {
        Self {
            adc: Adc::adc1(adc1, true, AdcConfig::default()),
            pin,
            sample_time: SampleTime::Cycles_480,
        }
    }
}

impl AnalogInput for Potentiometer {
    fn configure_resolution(&mut self, bits: u8) {
        let resolution = match bits {
            12..=u8::MAX => Resolution::Twelve,
            10 | 11 => Resolution::Ten,
            8 | 9 => Resolution::Eight,
            _ => Resolution::Six,
        };
        self.adc.set_resolution(resolution);
    }

    fn configure_input_range(&mut self, channel: u8, attenuation: Attenuation) {
        // The F4 converter always spans 0..VDDA; a long sample time suits the pot's source impedance.
        self.sample_time = SampleTime::Cycles_480;
        defmt::debug!("ADC1 IN{} full range, requested {}", channel, attenuation);
    }

    fn read_raw(&mut self, _channel: u8) -> u16 {
        self.adc.convert(&self.pin, self.sample_time)
    }
}

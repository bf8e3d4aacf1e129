#![deny(unsafe_code)]
//#![deny(warnings)]
#![no_main]
#![no_std]

mod peripherals;

use defmt_rtt as _; // global logger over RTT
use panic_halt as _; // panic handler

use rtic_monotonics::systick::prelude::*;

systick_monotonic!(Mono, 10_000);

/// Period-completed flags, raised by the TIM1 update task and taken by idle.
static PENDING: [spwm_inverter::PendingFlag; 3] = [
    spwm_inverter::PendingFlag::new(),
    spwm_inverter::PendingFlag::new(),
    spwm_inverter::PendingFlag::new(),
];

#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true)]
mod app {
    use super::{Mono, PENDING};
    use rtic_monotonics::Monotonic;
    use stm32f4xx_hal::{gpio::{Output, Pin}, prelude::*};
    use spwm_inverter::config::TABLE_LEN;
    use spwm_inverter::hardware::{PinId, UnitId};
    use spwm_inverter::{
        AnalogConfig, AnalogScaler, CycleCompletionHandler, DeadTime, FrequencyRange, Inverter,
        InverterConfig, SINE_TABLE,
    };
    use crate::peripherals::{
        potentiometer::Potentiometer,
        pwm_driver,
        pwm_driver::InverterBridge,
        Heartbeat,
    };

    /// Microseconds per monotonic tick.
    const TICK_US: u32 = 100;
    const POT_CHANNEL: u8 = 0;

    const INVERTER: InverterConfig = InverterConfig::three_phase(
        UnitId(0),
        [
            (PinId::new('A', 8), PinId::new('B', 13)),
            (PinId::new('A', 9), PinId::new('B', 14)),
            (PinId::new('A', 10), PinId::new('B', 15)),
        ],
        DeadTime::DEFAULT,
        FrequencyRange::DEFAULT,
    );

    #[shared]
    struct Shared {
        bridge: InverterBridge,
    }

    #[local]
    struct Local {
        inverter: Inverter<'static, TABLE_LEN>,
        completion: CycleCompletionHandler<'static>,
        scaler: AnalogScaler,
        pot: Potentiometer,
        heartbeat: Heartbeat<Pin<'C', 13, Output>>,
    }

    fn now_us() -> u32 {
        Mono::now().ticks().wrapping_mul(TICK_US)
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let dp = cx.device;
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr
            .sysclk(96.MHz())
            .use_hse(25.MHz())
            .hclk(96.MHz())
            .pclk1(48.MHz())
            .pclk2(96.MHz())
            .freeze();

        Mono::start(cx.core.SYST, clocks.sysclk().to_Hz());

        let gpioa = dp.GPIOA.split();
        let gpiob = dp.GPIOB.split();
        let gpioc = dp.GPIOC.split();

        let mut bridge = pwm_driver::init(
            dp.TIM1,
            (gpioa.pa8, gpiob.pb13, gpioa.pa9, gpiob.pb14, gpioa.pa10, gpiob.pb15),
            &clocks,
        );

        let mut inverter = Inverter::new(INVERTER, &SINE_TABLE, &PENDING)
            .unwrap_or_else(|e| defmt::panic!("inverter configuration rejected: {}", e));
        let completion = inverter.init(&mut bridge);

        let mut pot = Potentiometer::new(dp.ADC1, gpioa.pa0.into_analog());
        let mut scaler = AnalogScaler::new(AnalogConfig::new(POT_CHANNEL), now_us())
            .unwrap_or_else(|e| defmt::panic!("analog configuration rejected: {}", e));
        scaler.init(&mut pot);

        let heartbeat = Heartbeat::new(gpioc.pc13.into_push_pull_output());

        defmt::info!(
            "SPWM running, carrier {}Hz, sampling every {}us",
            inverter.carrier_hz(),
            AnalogConfig::new(POT_CHANNEL).sample_period_us
        );

        (Shared { bridge }, Local { inverter, completion, scaler, pot, heartbeat })
    }

    #[idle(shared = [bridge], local = [inverter, scaler, pot, heartbeat])]
    fn idle(mut cx: idle::Context) -> ! {
        let inverter = cx.local.inverter;
        let scaler = cx.local.scaler;
        let pot = cx.local.pot;
        let heartbeat = cx.local.heartbeat;

        loop {
            let now = now_us();
            // Only mask the completion interrupt when there is work to do.
            if scaler.is_due(now) || inverter.has_pending() {
                cx.shared.bridge.lock(|bridge| {
                    if scaler.poll(now, pot, inverter, bridge).is_some() {
                        heartbeat.beat();
                    }
                    inverter.service(bridge);
                });
            }
        }
    }

    #[task(binds = TIM1_UP_TIM10, shared = [bridge], local = [completion])]
    fn period_elapsed(mut cx: period_elapsed::Context) {
        let completion = cx.local.completion;
        cx.shared.bridge.lock(|bridge| {
            completion.on_interrupt(bridge);
        });
    }
}

//! Three-phase sinusoidal PWM engine.
//!
//! Each leg walks a shared sine table one step per completed PWM period. The
//! completion interrupt only raises a per-leg flag; the foreground loop takes
//! the flag, writes the next duty and advances the cursor. A potentiometer
//! sample scales both the amplitude and the carrier, and the carrier is kept at
//! `table length x output frequency` so one table walk is one output cycle.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod analog;
pub mod completion;
pub mod config;
pub mod hardware;
pub mod inverter;
pub mod phase;
pub mod sine_table;

pub use analog::AnalogScaler;
pub use completion::CycleCompletionHandler;
pub use config::{AnalogConfig, ConfigError, DeadTime, FrequencyRange, InverterConfig, PhaseConfig};
pub use inverter::Inverter;
pub use phase::{PendingFlag, PhaseChannel};
pub use sine_table::{SineTable, SINE_TABLE};

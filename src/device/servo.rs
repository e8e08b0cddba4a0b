//! Simulated servo
//!
//! Hooks for a small servo modelled on the AX-12 layout: the base fields,
//! an LED and a lazily sampled temperature.

use crate::control_table::{offset, ControlTable, Registers, TableHooks};
use crate::port::Port;
use crate::storage::Storage;

/// Servo-specific hooks
#[derive(Debug, Clone)]
pub struct SimulatedServo {
    temperature: u8,
    led_on: bool,
}

impl SimulatedServo {
    /// Control table length
    pub const NUM_CTL_BYTES: usize = 50;

    /// Persistent prefix length (everything before torque enable)
    pub const NUM_PERSISTENT_BYTES: usize = 24;

    pub const MODEL: u16 = 0x000C;

    pub const FIRMWARE_VERSION: u8 = 1;

    /// Present temperature, degrees Celsius
    pub const PRESENT_TEMPERATURE: u8 = 0x2B;

    pub fn new() -> Self {
        Self {
            temperature: 25,
            led_on: false,
        }
    }

    /// Build a table sized for this servo
    pub fn into_table<S: Storage, P: Port>(
        self,
        storage: S,
        port: P,
    ) -> ControlTable<Self, S, P> {
        ControlTable::new(
            Self::NUM_CTL_BYTES,
            Self::NUM_PERSISTENT_BYTES,
            self,
            storage,
            port,
        )
    }

    /// Value reported the next time the temperature field is read
    pub fn set_temperature(&mut self, celsius: u8) {
        self.temperature = celsius;
    }

    pub fn temperature(&self) -> u8 {
        self.temperature
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }
}

impl Default for SimulatedServo {
    fn default() -> Self {
        Self::new()
    }
}

impl TableHooks for SimulatedServo {
    fn set_initial_values(&mut self, regs: &mut Registers) {
        regs.write(offset::MODEL, Self::MODEL);
        regs.write(offset::VERSION, Self::FIRMWARE_VERSION);
        self.led_on = false;
    }

    fn populate_entry(&mut self, regs: &mut Registers, offset: u8) {
        if offset == Self::PRESENT_TEMPERATURE {
            regs.write(offset, self.temperature);
        }
    }

    fn entry_modified(&mut self, regs: &mut Registers, offset: u8) {
        if offset == offset::LED {
            let on = regs.read::<u8>(offset::LED) != 0;
            if on != self.led_on {
                tracing::info!("LED {}", if on { "on" } else { "off" });
                self.led_on = on;
            }
        }
    }
}

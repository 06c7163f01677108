//! Raspberry Pi GPIO line
//!
//! Bit-bangs the bus from userspace through `/dev/gpiomem`. The pin this line
//! is attached to must be externally pulled up.

use crate::{
    Result,
    line::{Direction, Level, Line, SpinDelay},
};
use embedded_hal::blocking::delay::DelayUs;
use log::debug;
use rppal::gpio::{self, Gpio, IoPin, Mode};

/// Header pin P1-16
pub const DEFAULT_PIN: u8 = 23;

/// A BCM GPIO pin used as the 1-Wire line
pub struct GpioLine {
    pin: IoPin,
    delay: SpinDelay,
}

impl GpioLine {
    /// Takes the BCM GPIO `pin`, released (input) until the first slot.
    pub fn new(pin: u8) -> Result<Self> {
        let mut pin = Gpio::new()?.get(pin)?.into_io(Mode::Input);
        pin.set_reset_on_drop(true);
        debug!("GPIO {} acquired", pin.pin());
        Ok(Self {
            pin,
            delay: SpinDelay,
        })
    }
}

impl Line for GpioLine {
    fn set_direction(&mut self, direction: Direction) {
        self.pin.set_mode(match direction {
            Direction::Input => Mode::Input,
            Direction::Output => Mode::Output,
        });
    }

    fn write_level(&mut self, level: Level) {
        self.pin.write(match level {
            Level::Low => gpio::Level::Low,
            Level::High => gpio::Level::High,
        });
    }

    fn read_level(&mut self) -> Level {
        match self.pin.read() {
            gpio::Level::Low => Level::Low,
            gpio::Level::High => Level::High,
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

//! Single line I/O capability
//!
//! The 1-Wire bus is one open-drain conductor pulled up externally (4.7kOhm).
//! The master either drives it low or releases it (input) and lets the
//! pull-up and the device decide the level. Everything above this module only
//! talks to the bus through [`Line`], so the protocol engine can be driven
//! against a simulated peer as well as a real pin.

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};
use std::{
    convert::Infallible,
    hint::spin_loop,
    time::{Duration, Instant},
};

/// Pin direction
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// Line level
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        match value {
            false => Level::Low,
            true => Level::High,
        }
    }
}

impl From<Level> for bool {
    fn from(value: Level) -> Self {
        value == Level::High
    }
}

/// Direction, level and microsecond delay primitives on one physical line.
///
/// Implementations must not yield between calls: the slot timing of the
/// protocol is only as good as `delay_us`.
pub trait Line {
    fn set_direction(&mut self, direction: Direction);

    /// Sets the output latch. Only visible on the bus while the direction is
    /// [`Direction::Output`].
    fn write_level(&mut self, level: Level);

    fn read_level(&mut self) -> Level;

    fn delay_us(&mut self, us: u32);
}

impl<L: Line + ?Sized> Line for &mut L {
    fn set_direction(&mut self, direction: Direction) {
        (**self).set_direction(direction)
    }

    fn write_level(&mut self, level: Level) {
        (**self).write_level(level)
    }

    fn read_level(&mut self) -> Level {
        (**self).read_level()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// [`Line`] on an open-drain HAL pin and a HAL delay.
///
/// The pin is only ever pulled low or released, so it has to be configured
/// open-drain with an external pull-up. Pin operations must be infallible.
pub struct OpenDrain<P, D> {
    pin: P,
    delay: D,
    direction: Direction,
    level: Level,
}

impl<P, D> OpenDrain<P, D>
where
    P: OutputPin<Error = Infallible>,
{
    /// Takes the pin and releases the line.
    pub fn new(pin: P, delay: D) -> Self {
        let mut line = Self {
            pin,
            delay,
            direction: Direction::Input,
            level: Level::High,
        };
        line.drive();
        line
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn drive(&mut self) {
        let Ok(()) = match (self.direction, self.level) {
            (Direction::Output, Level::Low) => self.pin.set_low(),
            _ => self.pin.set_high(),
        };
    }
}

impl<P, D> Line for OpenDrain<P, D>
where
    P: InputPin<Error = Infallible> + OutputPin<Error = Infallible>,
    D: DelayUs<u32>,
{
    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.drive();
    }

    fn write_level(&mut self, level: Level) {
        self.level = level;
        self.drive();
    }

    fn read_level(&mut self) -> Level {
        let Ok(high) = self.pin.is_high();
        high.into()
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

/// Busy-waits for (at least) `duration`. Never yields to the scheduler.
pub fn spin_wait(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        spin_loop();
    }
}

/// [`DelayUs`] on [`spin_wait`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinDelay;

impl DelayUs<u32> for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        spin_wait(Duration::from_micros(us.into()));
    }
}

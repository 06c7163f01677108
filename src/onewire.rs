//! Bit-banged Onewire implementation
//!
//! Bits are sent by starting a time slot (pulling the line low) and then
//! either keeping it low or releasing it. The device samples 15-60us after
//! the falling edge and registers a 1 if the line is high or a 0 if it is low.
//!
//! Bits are received by starting a slot with a brief low pulse and releasing
//! the line. The device holds the line low for most of the slot to send a 0
//! or lets it float high to send a 1; the master samples shortly after
//! release.
//!
//! Bytes go least significant bit first, addresses least significant byte
//! first.

use crate::line::{Direction, Level, Line};
use std::fmt;

/// Reset pulse (master holds the line low)
pub const RESET_LOW_US: u32 = 480;
/// Release to presence sample
pub const PRESENCE_SAMPLE_US: u32 = 70;
/// Presence sample to end of the reset sequence
pub const PRESENCE_RECOVERY_US: u32 = 410;

/// Write 1 slot: (low, high)
pub const WRITE_ONE_US: (u32, u32) = (10, 55);
/// Write 0 slot: (low, high)
pub const WRITE_ZERO_US: (u32, u32) = (65, 5);

/// Read slot initiation (master holds the line low)
pub const READ_LOW_US: u32 = 5;
/// Release to sample
pub const READ_SAMPLE_US: u32 = 10;
/// Sample to end of slot
pub const READ_RECOVERY_US: u32 = 53;

/// Minimum duration of a time slot
pub const SLOT_US: u32 = 60;

/// ROM function commands
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum OWCommand {
    ReadRom = 0x33,
    MatchRom = 0x55,
    Search = 0xF0,
    SkipRom = 0xCC,
    /// Conditional search for all devices in an alarm state.
    SearchAlarm = 0xEC,
}

/// Slot level transceiver on top of a [`Line`].
///
/// Implemented for every line; every method runs to completion and busy-waits
/// through the whole slot.
pub trait OneWire: Line {
    /// Sends a reset pulse, then returns true if a device answered with a
    /// presence pulse.
    fn reset(&mut self) -> bool {
        self.set_direction(Direction::Output);
        self.write_level(Level::Low);
        self.delay_us(RESET_LOW_US);
        self.set_direction(Direction::Input);
        self.delay_us(PRESENCE_SAMPLE_US);
        let level = self.read_level();
        self.delay_us(PRESENCE_RECOVERY_US);
        level == Level::Low
    }

    fn write_bit(&mut self, bit: bool) {
        let (low, high) = if bit { WRITE_ONE_US } else { WRITE_ZERO_US };
        self.set_direction(Direction::Output);
        self.write_level(Level::Low);
        self.delay_us(low);
        self.write_level(Level::High);
        self.delay_us(high);
        self.set_direction(Direction::Input);
    }

    fn read_bit(&mut self) -> bool {
        self.set_direction(Direction::Output);
        self.write_level(Level::Low);
        self.delay_us(READ_LOW_US);
        self.set_direction(Direction::Input);
        self.delay_us(READ_SAMPLE_US);
        let level = self.read_level();
        self.delay_us(READ_RECOVERY_US);
        level.into()
    }

    fn write_byte(&mut self, mut byte: u8) {
        for _ in 0..u8::BITS {
            self.write_bit(byte & 0b1 != 0);
            byte >>= 1;
        }
    }

    fn read_byte(&mut self) -> u8 {
        let mut byte = 0;
        for index in 0..u8::BITS {
            if self.read_bit() {
                byte |= 1 << index;
            }
        }
        byte
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) {
        for byte in buffer {
            *byte = self.read_byte();
        }
    }

    /// Writes a 16-bit address, low byte first.
    fn write_address(&mut self, address: u16) {
        self.write_bytes(&address.to_le_bytes());
    }

    /// Reads a 16-bit address, low byte first.
    fn read_address(&mut self) -> u16 {
        let mut buffer = [0; 2];
        self.read_bytes(&mut buffer);
        u16::from_le_bytes(buffer)
    }
}

impl<L: Line + ?Sized> OneWire for L {}

/// 64-bit ROM code: family code, 48-bit serial number and CRC, in wire order
/// from the least significant byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RomCode(pub u64);

impl RomCode {
    pub fn family_code(&self) -> u8 {
        self.0 as _
    }

    pub fn serial_number(&self) -> u64 {
        (self.0 >> 8) & 0xFFFF_FFFF_FFFF
    }

    pub fn crc(&self) -> u8 {
        (self.0 >> 56) as _
    }
}

impl From<[u8; 8]> for RomCode {
    fn from(value: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(value))
    }
}

/// Hex bytes in wire order: family code, serial number, CRC.
impl fmt::Display for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0.to_le_bytes() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

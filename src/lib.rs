pub use self::{
    error::{Error, Result},
    line::{Direction, Level, Line, OpenDrain, SpinDelay},
    onewire::{OWCommand, OneWire, RomCode},
    register::{ControlRegister, FAILURE_TEMPERATURE, map, temperature},
    rtc::{HourMode, Rtc},
    scratchpad::{Scratchpad, Transaction},
};

use chrono::{Datelike, Local, Timelike};
use log::{debug, warn};

/// The ds1921 family code
pub const FAMILY_CODE: u8 = 0x21;
/// Wait after a convert temperature command
pub const CONVERSION_TIME_US: u32 = 200;
/// Wait after a copy scratchpad command
pub const COMMIT_TIME_US: u32 = 1_000;
/// Wait after a clear memory command
pub const CLEAR_TIME_US: u32 = 500;

/// Driver configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    pub conversion_time_us: u32,
    pub commit_time_us: u32,
    pub clear_time_us: u32,
    /// Re-read the scratchpad after a copy and require the authorization
    /// accepted flag.
    pub verify_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conversion_time_us: CONVERSION_TIME_US,
            commit_time_us: COMMIT_TIME_US,
            clear_time_us: CLEAR_TIME_US,
            verify_commit: true,
        }
    }
}

/// The ds1921 (thermochron iButton) driver
///
/// Only a single device on the bus is supported: every operation addresses
/// it with skip ROM.
pub struct Ds1921Driver<L> {
    pub line: L,
    pub config: Config,
}

impl<L: Line> Ds1921Driver<L> {
    pub fn new(line: L) -> Self {
        Self::with_config(line, Config::default())
    }

    pub fn with_config(line: L, config: Config) -> Self {
        Self { line, config }
    }

    pub fn into_inner(self) -> L {
        self.line
    }

    /// Reset the bus, fails if no device answers with a presence pulse.
    pub fn initialization(&mut self) -> Result<Rom<&mut Self>> {
        if !self.line.reset() {
            debug!("no presence pulse");
            return Err(Error::Presence);
        }
        Ok(Rom(self))
    }

    /// Read the ROM code of the (single) device on the bus
    pub fn rom(&mut self) -> Result<RomCode> {
        Ok(self.initialization()?.read_rom())
    }

    /// One-shot conversion
    pub fn temperature(&mut self) -> Result<f32> {
        self.initialization()?.skip_rom().convert_temperature();
        let mut raw = [0];
        self.read_memory(map::TEMPERATURE, &mut raw)?;
        let temperature = temperature(raw[0]);
        debug!("temperature: {:#04x} -> {temperature}", raw[0]);
        Ok(temperature)
    }

    /// Read `buffer.len()` bytes starting at `address`
    pub fn read_memory(&mut self, address: u16, buffer: &mut [u8]) -> Result<()> {
        self.initialization()?
            .skip_rom()
            .read_memory(address, buffer);
        Ok(())
    }

    /// Write-verify-commit a scratchpad transaction.
    ///
    /// Nothing is copied to memory unless the address and ending offset read
    /// back from the scratchpad match the transaction. The payload bytes
    /// themselves are not checked.
    pub fn write(&mut self, transaction: &Transaction) -> Result<()> {
        debug!(
            "write {{ address={:#06x}, payload={:02x?} }}",
            transaction.address(),
            transaction.payload(),
        );
        self.initialization()?
            .skip_rom()
            .write_scratchpad(transaction);
        let scratchpad = self.initialization()?.skip_rom().read_scratchpad();
        if let Err(error) = transaction.verify(&scratchpad) {
            warn!("scratchpad discarded: {error}");
            return Err(error);
        }
        self.initialization()?
            .skip_rom()
            .copy_scratchpad(&scratchpad);
        if self.config.verify_commit {
            let scratchpad = self.initialization()?.skip_rom().read_scratchpad();
            if !scratchpad.authorization_accepted() {
                warn!("copy scratchpad not accepted: {scratchpad:x?}");
                return Err(Error::Commit {
                    address: scratchpad.address,
                    status: scratchpad.status,
                });
            }
        }
        Ok(())
    }

    /// Set the RTC registers
    pub fn set_rtc<T: Datelike + Timelike>(&mut self, time: &T) -> Result<()> {
        let rtc = Rtc::new(time);
        debug!("set rtc: {rtc:?}");
        self.write(&Transaction::new(map::RTC_SECONDS, rtc.to_bytes()?)?)
    }

    /// Set the RTC registers from the local wall clock
    pub fn set_rtc_now(&mut self) -> Result<()> {
        self.set_rtc(&Local::now())
    }

    /// Clear the mission, histogram and data log memory.
    pub fn clear_memory(&mut self) -> Result<()> {
        let control = ControlRegister::clear();
        self.write(&Transaction::new(map::CONTROL, [u8::from(control)])?)?;
        self.initialization()?.skip_rom().clear_memory();
        self.line.reset();
        Ok(())
    }

    /// Start a mission after `delay` minutes.
    ///
    /// Writes the control register and the mission start delay in one
    /// transaction. The three registers in between are read only and ignore
    /// the zero bytes.
    pub fn start_mission(&mut self, control: ControlRegister, delay: u16) -> Result<()> {
        let [low, high] = delay.to_le_bytes();
        self.write(&Transaction::new(
            map::CONTROL,
            [u8::from(control), 0, 0, 0, low, high],
        )?)?;
        self.line.reset();
        Ok(())
    }
}

/// ROM commands
pub struct Rom<T>(T);

impl<'a, L: Line> Rom<&'a mut Ds1921Driver<L>> {
    /// Read ROM command
    ///
    /// Reads the 8-bit family code, 48-bit serial number and 8-bit CRC. Only
    /// usable with a single device on the bus.
    pub fn read_rom(self) -> RomCode {
        let line = &mut self.0.line;
        line.write_byte(OWCommand::ReadRom as _);
        let mut buffer = [0; 8];
        line.read_bytes(&mut buffer);
        RomCode::from(buffer)
    }

    /// Skip ROM command
    ///
    /// Addresses every device on the bus at once.
    pub fn skip_rom(self) -> Ram<&'a mut Ds1921Driver<L>> {
        self.0.line.write_byte(OWCommand::SkipRom as _);
        Ram(self.0)
    }
}

/// RAM commands
pub struct Ram<T>(T);

impl<L: Line> Ram<&mut Ds1921Driver<L>> {
    /// Writes the target address and payload into the scratchpad.
    pub fn write_scratchpad(self, transaction: &Transaction) {
        let line = &mut self.0.line;
        line.write_byte(Command::WriteScratchpad as _);
        line.write_address(transaction.address());
        line.write_bytes(transaction.payload());
    }

    /// Reads the target address and ending offset/data status.
    pub fn read_scratchpad(self) -> Scratchpad {
        let line = &mut self.0.line;
        line.write_byte(Command::ReadScratchpad as _);
        let address = line.read_address();
        let status = line.read_byte();
        Scratchpad { address, status }
    }

    /// Copies the scratchpad to memory. The authorization pattern has to
    /// repeat what [`read_scratchpad`](Self::read_scratchpad) returned.
    pub fn copy_scratchpad(self, scratchpad: &Scratchpad) {
        let line = &mut self.0.line;
        line.write_byte(Command::CopyScratchpad as _);
        line.write_address(scratchpad.address);
        line.write_byte(scratchpad.status);
        line.delay_us(self.0.config.commit_time_us);
    }

    pub fn read_memory(self, address: u16, buffer: &mut [u8]) {
        let line = &mut self.0.line;
        line.write_byte(Command::ReadMemory as _);
        line.write_address(address);
        line.read_bytes(buffer);
    }

    /// Starts a temperature conversion and waits it out. The result lands
    /// in the temperature register.
    pub fn convert_temperature(self) {
        let line = &mut self.0.line;
        line.write_byte(Command::ConvertTemperature as _);
        line.delay_us(self.0.config.conversion_time_us);
    }

    /// Clears memory if the control register has memory clear enabled.
    pub fn clear_memory(self) {
        let line = &mut self.0.line;
        line.write_byte(Command::ClearMemory as _);
        line.delay_us(self.0.config.clear_time_us);
    }
}

/// RAM function commands
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Command {
    WriteScratchpad = 0x0F,
    ReadScratchpad = 0xAA,
    CopyScratchpad = 0x55,
    ReadMemory = 0xF0,
    ReadMemoryCrc = 0xA5,
    ClearMemory = 0x3C,
    /// Not a memory function, but issued in its place.
    ConvertTemperature = 0x44,
}

pub mod error;
#[cfg(feature = "rppal")]
pub mod gpio;
pub mod line;
pub mod onewire;
pub mod register;
pub mod rtc;
pub mod scratchpad;

#[cfg(test)]
mod simulator;

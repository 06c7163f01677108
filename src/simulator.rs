//! Virtual time ds1921 peer
//!
//! Decodes the master's slots from how long it holds the line low, the same
//! way the device does: a reset is a long low pulse, a write 0 holds the line
//! past the sample point, anything shorter is a 1. While the device has data
//! to send every slot is a read slot and a 0 is answered by holding the line
//! low.

use crate::{
    Command,
    line::{Direction, Level, Line},
    map,
    onewire::OWCommand,
    scratchpad::PAGE_SIZE,
};
use std::collections::VecDeque;

const MEMORY_SIZE: usize = 0x2000;
const RESET_US: u64 = 400;
const SAMPLE_US: u64 = 15;
const PRESENCE_WAIT_US: u64 = 15;
const PRESENCE_US: u64 = 120;
const HOLD_US: u64 = 45;
const AUTHORIZATION_ACCEPTED: u8 = 0b1000_0000;
const CLEAR_MEMORY: u8 = 0b0100_0000;

const SKIP_ROM: u8 = OWCommand::SkipRom as _;
const READ_ROM: u8 = OWCommand::ReadRom as _;
const WRITE_SCRATCHPAD: u8 = Command::WriteScratchpad as _;
const READ_SCRATCHPAD: u8 = Command::ReadScratchpad as _;
const COPY_SCRATCHPAD: u8 = Command::CopyScratchpad as _;
const READ_MEMORY: u8 = Command::ReadMemory as _;
const CONVERT_TEMPERATURE: u8 = Command::ConvertTemperature as _;
const CLEAR_MEMORY_COMMAND: u8 = Command::ClearMemory as _;

pub const ROM: [u8; 8] = [0x21, 0x5A, 0x3C, 0x01, 0x00, 0x00, 0x00, 0x9E];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Read scratchpad reports the next address
    Address,
    /// The first payload byte never reaches the scratchpad
    DropByte,
    /// Copy scratchpad is ignored
    RejectCopy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Rom,
    Ram,
    WriteScratchpad,
    CopyScratchpad,
    ReadMemory,
}

pub struct Simulator {
    pub present: bool,
    pub fault: Option<Fault>,
    /// Temperature register value after a conversion
    pub raw_temperature: u8,
    pub memory: Vec<u8>,
    pub falling_edges: usize,
    pub resets: usize,
    pub commits: usize,
    pub conversions: usize,
    pub clears: usize,
    /// Every byte the device received, in order
    pub received: Vec<u8>,

    now: u64,
    output: bool,
    latch: Level,
    falling: u64,
    read_slot: bool,
    holding_until: u64,
    presence: (u64, u64),

    state: State,
    rx: (u8, u32),
    arguments: Vec<u8>,
    tx: VecDeque<bool>,
    streaming: Option<u16>,

    scratchpad: [u8; PAGE_SIZE],
    target: u16,
    status: u8,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            present: true,
            fault: None,
            raw_temperature: 0x50,
            memory: vec![0; MEMORY_SIZE],
            falling_edges: 0,
            resets: 0,
            commits: 0,
            conversions: 0,
            clears: 0,
            received: Vec::new(),
            now: 0,
            output: false,
            latch: Level::High,
            falling: 0,
            read_slot: false,
            holding_until: 0,
            presence: (0, 0),
            state: State::Idle,
            rx: (0, 0),
            arguments: Vec::new(),
            tx: VecDeque::new(),
            streaming: None,
            scratchpad: [0; PAGE_SIZE],
            target: 0,
            status: 0,
        }
    }
}

impl Simulator {
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Default::default()
        }
    }

    pub fn faulty(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn memory(&self, address: u16, length: usize) -> &[u8] {
        &self.memory[address as usize..][..length]
    }

    fn driving_low(&self) -> bool {
        self.output && self.latch == Level::Low
    }

    fn update(&mut self, was_low: bool) {
        match (was_low, self.driving_low()) {
            (false, true) => self.fall(),
            (true, false) => self.rise(),
            _ => {}
        }
    }

    fn fall(&mut self) {
        self.falling_edges += 1;
        self.falling = self.now;
        self.read_slot = false;
        if let Some(bit) = self.next_tx_bit() {
            self.read_slot = true;
            if !bit {
                self.holding_until = self.now + HOLD_US;
            }
        }
    }

    fn rise(&mut self) {
        let low = self.now - self.falling;
        if low >= RESET_US {
            self.reset();
        } else if !self.read_slot && self.state != State::Idle {
            self.receive_bit(low < SAMPLE_US);
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.rx = (0, 0);
        self.arguments.clear();
        self.tx.clear();
        self.streaming = None;
        if self.present {
            self.state = State::Rom;
            self.presence = (
                self.now + PRESENCE_WAIT_US,
                self.now + PRESENCE_WAIT_US + PRESENCE_US,
            );
        } else {
            self.state = State::Idle;
        }
    }

    fn next_tx_bit(&mut self) -> Option<bool> {
        if self.tx.is_empty() {
            if let Some(address) = self.streaming {
                let byte = self.memory.get(address as usize).copied().unwrap_or(0xFF);
                self.transmit(&[byte]);
                self.streaming = Some(address.wrapping_add(1));
            }
        }
        self.tx.pop_front()
    }

    fn transmit(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.tx.extend((0..u8::BITS).map(|index| byte >> index & 0b1 != 0));
        }
    }

    fn receive_bit(&mut self, bit: bool) {
        let (byte, count) = &mut self.rx;
        if bit {
            *byte |= 1 << *count;
        }
        *count += 1;
        if *count == u8::BITS {
            let byte = *byte;
            self.rx = (0, 0);
            self.received.push(byte);
            self.receive_byte(byte);
        }
    }

    fn receive_byte(&mut self, byte: u8) {
        match self.state {
            State::Idle => {}
            State::Rom => {
                self.state = match byte {
                    SKIP_ROM => State::Ram,
                    READ_ROM => {
                        self.transmit(&ROM);
                        State::Idle
                    }
                    _ => State::Idle,
                };
            }
            State::Ram => {
                self.state = match byte {
                    WRITE_SCRATCHPAD => State::WriteScratchpad,
                    COPY_SCRATCHPAD => State::CopyScratchpad,
                    READ_MEMORY => State::ReadMemory,
                    READ_SCRATCHPAD => {
                        self.read_scratchpad();
                        State::Idle
                    }
                    CONVERT_TEMPERATURE => {
                        self.conversions += 1;
                        self.memory[map::TEMPERATURE as usize] = self.raw_temperature;
                        State::Idle
                    }
                    CLEAR_MEMORY_COMMAND => {
                        if self.memory[map::CONTROL as usize] & CLEAR_MEMORY != 0 {
                            self.clears += 1;
                            self.memory[map::HISTOGRAM as usize..].fill(0);
                        }
                        State::Idle
                    }
                    _ => State::Idle,
                };
            }
            State::WriteScratchpad => self.write_scratchpad(byte),
            State::CopyScratchpad => {
                self.arguments.push(byte);
                if self.arguments.len() == 3 {
                    self.copy_scratchpad();
                    self.state = State::Idle;
                }
            }
            State::ReadMemory => {
                self.arguments.push(byte);
                if self.arguments.len() == 2 {
                    self.streaming = Some(u16::from_le_bytes([
                        self.arguments[0],
                        self.arguments[1],
                    ]));
                    self.state = State::Idle;
                }
            }
        }
    }

    fn write_scratchpad(&mut self, byte: u8) {
        self.arguments.push(byte);
        match self.arguments.len() {
            1 => {}
            2 => {
                self.target = u16::from_le_bytes([self.arguments[0], self.arguments[1]]);
                self.status = (self.target as u8 & 0x1F).wrapping_sub(1);
            }
            3 if self.fault == Some(Fault::DropByte) => {}
            _ => {
                let offset = (self.status.wrapping_add(1) & 0x1F) as usize;
                self.scratchpad[offset] = byte;
                self.status = offset as u8;
            }
        }
    }

    fn read_scratchpad(&mut self) {
        let mut address = self.target;
        if self.fault == Some(Fault::Address) {
            address += 1;
        }
        let [low, high] = address.to_le_bytes();
        let status = self.status;
        self.transmit(&[low, high, status]);
    }

    fn copy_scratchpad(&mut self) {
        let [low, high] = self.target.to_le_bytes();
        if self.arguments != [low, high, self.status] || self.fault == Some(Fault::RejectCopy) {
            return;
        }
        let page = (self.target & !0x1F) as usize;
        let start = (self.target & 0x1F) as usize;
        let end = (self.status & 0x1F) as usize;
        self.memory[page + start..=page + end].copy_from_slice(&self.scratchpad[start..=end]);
        self.status |= AUTHORIZATION_ACCEPTED;
        self.commits += 1;
    }
}

impl Line for Simulator {
    fn set_direction(&mut self, direction: Direction) {
        let was_low = self.driving_low();
        self.output = direction == Direction::Output;
        self.update(was_low);
    }

    fn write_level(&mut self, level: Level) {
        let was_low = self.driving_low();
        self.latch = level;
        self.update(was_low);
    }

    fn read_level(&mut self) -> Level {
        let (from, until) = self.presence;
        if self.driving_low()
            || self.now < self.holding_until
            || (from..until).contains(&self.now)
        {
            Level::Low
        } else {
            Level::High
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.now += us as u64;
    }
}

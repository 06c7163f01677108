//! Memory map and register layout

/// Memory map
pub mod map {
    pub const SRAM: u16 = 0x0000;
    pub const REGISTERS: u16 = 0x0200;
    pub const ALARMS: u16 = 0x0220;
    pub const RESERVED_1: u16 = 0x0280;
    pub const HISTOGRAM: u16 = 0x0800;
    pub const RESERVED_2: u16 = 0x0880;
    pub const DATA_LOG: u16 = 0x1000;
    pub const RESERVED_3: u16 = 0x1800;

    pub const RTC_SECONDS: u16 = 0x0200;
    pub const RTC_MINUTES: u16 = 0x0201;
    pub const RTC_HOURS: u16 = 0x0202;
    pub const RTC_DAY_OF_WEEK: u16 = 0x0203;
    pub const RTC_DATE: u16 = 0x0204;
    pub const RTC_MONTH: u16 = 0x0205;
    pub const RTC_YEAR: u16 = 0x0206;
    pub const RTC_ALARM_SECONDS: u16 = 0x0207;
    pub const RTC_ALARM_MINUTES: u16 = 0x0208;
    pub const RTC_ALARM_HOURS: u16 = 0x0209;
    pub const RTC_ALARM_DAY_OF_WEEK: u16 = 0x020A;
    pub const CONTROL: u16 = 0x020E;
    pub const TEMPERATURE: u16 = 0x0211;
    pub const MISSION_START_DELAY: u16 = 0x0212;
}

const DISABLE_OSCILLATOR: u8 = 0b1000_0000;
const CLEAR_MEMORY: u8 = 0b0100_0000;
const DISABLE_MISSION: u8 = 0b0001_0000;
const ROLLOVER: u8 = 0b0000_1000;
const TEMPERATURE_LOW_SEARCH: u8 = 0b0000_0100;
const TEMPERATURE_HIGH_SEARCH: u8 = 0b0000_0010;
const TIMER_ALARM_SEARCH: u8 = 0b0000_0001;

/// Decoded value the host reports for a failed conversion. Never produced by
/// [`temperature`].
pub const FAILURE_TEMPERATURE: f32 = -100.0;

/// Control register (0x020E)
///
/// The oscillator and mission bits are active low, so the default value
/// (all clear) runs the clock and allows a mission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ControlRegister {
    /// Stops the RTC oscillator (EOSC)
    pub disable_oscillator: bool,
    /// Arms the clear memory command (EMCLR)
    pub clear_memory: bool,
    /// Prevents a mission from starting (EM)
    pub disable_mission: bool,
    /// Data log wraps around when full (RO)
    pub rollover: bool,
    /// Conditional search answers on low temperature alarm (TLS)
    pub temperature_low_search: bool,
    /// Conditional search answers on high temperature alarm (THS)
    pub temperature_high_search: bool,
    /// Conditional search answers on timer alarm (TAS)
    pub timer_alarm_search: bool,
}

impl ControlRegister {
    /// Value to stage before a clear memory command.
    pub fn clear() -> Self {
        Self {
            clear_memory: true,
            ..Default::default()
        }
    }
}

impl From<u8> for ControlRegister {
    fn from(value: u8) -> Self {
        Self {
            disable_oscillator: value & DISABLE_OSCILLATOR != 0,
            clear_memory: value & CLEAR_MEMORY != 0,
            disable_mission: value & DISABLE_MISSION != 0,
            rollover: value & ROLLOVER != 0,
            temperature_low_search: value & TEMPERATURE_LOW_SEARCH != 0,
            temperature_high_search: value & TEMPERATURE_HIGH_SEARCH != 0,
            timer_alarm_search: value & TIMER_ALARM_SEARCH != 0,
        }
    }
}

impl From<ControlRegister> for u8 {
    fn from(value: ControlRegister) -> Self {
        [
            (value.disable_oscillator, DISABLE_OSCILLATOR),
            (value.clear_memory, CLEAR_MEMORY),
            (value.disable_mission, DISABLE_MISSION),
            (value.rollover, ROLLOVER),
            (value.temperature_low_search, TEMPERATURE_LOW_SEARCH),
            (value.temperature_high_search, TEMPERATURE_HIGH_SEARCH),
            (value.timer_alarm_search, TIMER_ALARM_SEARCH),
        ]
        .into_iter()
        .filter(|&(set, _)| set)
        .fold(0, |register, (_, bit)| register | bit)
    }
}

/// Temperature register value in half degrees above -40°C.
pub fn temperature(raw: u8) -> f32 {
    raw as f32 / 2.0 - 40.0
}

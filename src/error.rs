use thiserror::Error;

/// Result
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Error
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "rppal")]
    #[error(transparent)]
    Gpio(#[from] rppal::gpio::Error),
    #[error("no presence pulse after reset")]
    Presence,
    #[error(
        "unexpected scratchpad {{ address={address:#06x}, expected={expected_address:#06x}, ending_offset={ending_offset:#04x}, expected={expected_ending_offset:#04x} }}"
    )]
    Verification {
        address: u16,
        expected_address: u16,
        ending_offset: u8,
        expected_ending_offset: u8,
    },
    #[error("transaction crosses a scratchpad page {{ address={address:#06x}, length={length} }}")]
    PageBoundary { address: u16, length: usize },
    #[error("unexpected transaction length {{ length={0}, expected=1..=32 }}")]
    Length(usize),
    #[error("RTC field out of range {{ {field}={value} }}")]
    Rtc { field: &'static str, value: i32 },
    #[error("copy scratchpad not accepted {{ address={address:#06x}, status={status:#010b} }}")]
    Commit { address: u16, status: u8 },
}

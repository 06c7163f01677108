use crate::error::{Error, Result};

/// Scratchpad page size
pub const PAGE_SIZE: usize = 32;

const OFFSET_MASK: u16 = PAGE_SIZE as u16 - 1;
const ENDING_OFFSET: u8 = 0b0001_1111;
const PARTIAL_FLAG: u8 = 0b0010_0000;
const AUTHORIZATION_ACCEPTED: u8 = 0b1000_0000;

/// A write to nonvolatile memory staged through the scratchpad.
///
/// Always fits inside one 32-byte page; construction fails otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    address: u16,
    payload: Vec<u8>,
}

impl Transaction {
    pub fn new(address: u16, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();
        let length = payload.len();
        if length == 0 || length > PAGE_SIZE {
            return Err(Error::Length(length));
        }
        if (address & OFFSET_MASK) as usize + length > PAGE_SIZE {
            return Err(Error::PageBoundary { address, length });
        }
        Ok(Self { address, payload })
    }

    /// Target address (TA1, TA2)
    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Page offset of the last payload byte, the value the device reports
    /// back as ending offset.
    pub fn ending_offset(&self) -> u8 {
        (self.address & OFFSET_MASK) as u8 + self.payload.len() as u8 - 1
    }

    /// Checks the scratchpad read back from the device against this
    /// transaction. The whole E/S byte has to match, so a set partial flag
    /// fails the check as well.
    pub fn verify(&self, scratchpad: &Scratchpad) -> Result<()> {
        if scratchpad.address != self.address || scratchpad.status != self.ending_offset() {
            return Err(Error::Verification {
                address: scratchpad.address,
                expected_address: self.address,
                ending_offset: scratchpad.status,
                expected_ending_offset: self.ending_offset(),
            });
        }
        Ok(())
    }
}

/// Target address and ending offset/data status (E/S) read back from the
/// scratchpad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scratchpad {
    pub address: u16,
    pub status: u8,
}

impl Scratchpad {
    pub fn ending_offset(&self) -> u8 {
        self.status & ENDING_OFFSET
    }

    /// The last byte written to the scratchpad was incomplete (PF)
    pub fn partial(&self) -> bool {
        self.status & PARTIAL_FLAG != 0
    }

    /// The last copy scratchpad was accepted (AA)
    pub fn authorization_accepted(&self) -> bool {
        self.status & AUTHORIZATION_ACCEPTED != 0
    }
}

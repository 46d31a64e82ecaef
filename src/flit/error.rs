use thiserror::Error;

use super::slots::{GFormat, HFormat};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{what} must be {expected} bytes wide, got {got}")]
    Width { what: &'static str, expected: usize, got: usize },

    #[error("crc mismatch: flit carries {carried:#06x}, payload yields {computed:#06x}")]
    Crc { carried: u16, computed: u16 },
}

/// Slot position inside a protocol flit, with the format tag it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTag {
    Header(HFormat),
    Generic { slot: usize, format: GFormat },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("reserved slot format {0:?}")]
    ReservedSlotType(SlotTag),

    #[error("data chunk in slot {slot} with no outstanding cache line")]
    RolloverUnderflow { slot: usize },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

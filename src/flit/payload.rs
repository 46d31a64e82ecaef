//! Flit header, protocol flit framing and the sealed 528-bit flit.
//!
//! Payload bit map (bit 0 = least significant):
//!
//! | bits      | content      |
//! |-----------|--------------|
//! | 0..32     | flit header  |
//! | 32..128   | slot 0 (H)   |
//! | 128..256  | slot 1 (G)   |
//! | 256..384  | slot 2 (G)   |
//! | 384..512  | slot 3 (G)   |
//!
//! An all-data flit has no header: its four 128-bit words are laid out most
//! significant first.

use super::bits::Bits512;
use super::crc::{apply_crc, crc16, CRC_COEFFICIENTS};
use super::error::CodecError;
use super::schema::{record, Record};
use super::slots::{GFormat, HFormat, H_SLOT_BITS};

record! {
    /// 32-bit protocol flit header.
    pub struct FlitHeader : "flit header" {
        rsvd_crd: u8 = 4,
        data_crd: u8 = 4,
        req_crd: u8 = 4,
        rsp_crd: u8 = 4,
        slot3: u8 = 3,
        slot2: u8 = 3,
        slot1: u8 = 3,
        slot0: u8 = 3,
        sz: bool = 1,
        be: bool = 1,
        ak: bool = 1,
        /// Set on control flits.
        flit_type: bool = 1,
    }
}

const _: () = assert!(FlitHeader::WIDTH == 32);

pub const HEADER_BITS: usize = 32;

impl FlitHeader {
    pub fn is_control(&self) -> bool {
        self.flit_type
    }

    pub fn h_format(&self) -> HFormat {
        HFormat::from_bits(self.slot0)
    }

    /// Format of slot `index` (1 to 3).
    pub fn g_format(&self, index: usize) -> GFormat {
        match index {
            1 => GFormat::from_bits(self.slot1),
            2 => GFormat::from_bits(self.slot2),
            _ => GFormat::from_bits(self.slot3),
        }
    }

    pub fn with_formats(h: HFormat, g: [GFormat; 3]) -> Self {
        FlitHeader {
            slot0: h.bits(),
            slot1: g[0].bits(),
            slot2: g[1].bits(),
            slot3: g[2].bits(),
            ..Default::default()
        }
    }

    pub fn formats(&self) -> (HFormat, [GFormat; 3]) {
        (self.h_format(), [self.g_format(1), self.g_format(2), self.g_format(3)])
    }
}

/// A protocol flit split into header and raw slot contents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolFlit {
    pub header: FlitHeader,
    /// Slot 0, 96 bits.
    pub slot0: u128,
    /// Slots 1 to 3.
    pub slots: [u128; 3],
}

impl ProtocolFlit {
    /// Frames raw slot contents under a header naming their formats.
    pub fn new(h: HFormat, slot0: u128, slots: [(GFormat, u128); 3]) -> Self {
        ProtocolFlit {
            header: FlitHeader::with_formats(h, slots.map(|(format, _)| format)),
            slot0,
            slots: slots.map(|(_, bits)| bits),
        }
    }

    pub fn to_payload(&self) -> Bits512 {
        let mut bits = Bits512::ZERO;
        bits.set_bits(0, HEADER_BITS, self.header.pack());
        bits.set_bits(HEADER_BITS, H_SLOT_BITS, self.slot0);
        for (i, slot) in self.slots.iter().enumerate() {
            bits.set_chunk(i + 1, *slot);
        }
        bits
    }

    pub fn from_payload(bits: &Bits512) -> Self {
        ProtocolFlit {
            header: FlitHeader::unpack(bits.bits(0, HEADER_BITS)),
            slot0: bits.bits(HEADER_BITS, H_SLOT_BITS),
            slots: [bits.chunk(1), bits.chunk(2), bits.chunk(3)],
        }
    }
}

/// A sealed flit: 16-bit CRC above a 512-bit payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flit {
    pub crc: u16,
    pub payload: Bits512,
}

impl Flit {
    pub const BYTES: usize = 66;

    /// Computes the CRC of `payload` and attaches it.
    pub fn seal(payload: Bits512) -> Self {
        apply_crc(&payload, &CRC_COEFFICIENTS)
    }

    /// Verifies the carried CRC against the payload.
    pub fn check(&self) -> Result<(), CodecError> {
        let computed = crc16(&self.payload, &CRC_COEFFICIENTS);
        if computed == self.crc {
            Ok(())
        } else {
            Err(CodecError::Crc { carried: self.crc, computed })
        }
    }

    /// Little-endian bytes of the 528-bit value: payload first, CRC on top.
    pub fn to_bytes(&self) -> [u8; 66] {
        let mut out = [0u8; 66];
        out[..64].copy_from_slice(&self.payload.to_le_bytes());
        out[64..].copy_from_slice(&self.crc.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::BYTES {
            return Err(CodecError::Width { what: "flit", expected: Self::BYTES, got: bytes.len() });
        }
        let payload = Bits512::from_le_bytes(&bytes[..64])?;
        let crc = u16::from_le_bytes([bytes[64], bytes[65]]);
        Ok(Flit { crc, payload })
    }
}

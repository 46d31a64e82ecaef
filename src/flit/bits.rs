use std::fmt;
use std::ops::{BitAnd, BitXor};

use bitvec::prelude::*;

use super::error::CodecError;

/// 512-bit flit payload. Bit 0 is the least significant bit of limb 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bits512(pub(crate) [u64; 8]);

impl Bits512 {
    pub const BITS: usize = 512;
    pub const BYTES: usize = 64;
    pub const ZERO: Bits512 = Bits512([0; 8]);

    pub const fn from_limbs(limbs: [u64; 8]) -> Self {
        Bits512(limbs)
    }

    pub const fn limbs(&self) -> [u64; 8] {
        self.0
    }

    /// Reads `width` bits starting at bit `lsb`.
    pub fn bits(&self, lsb: usize, width: usize) -> u128 {
        if width == 0 {
            return 0;
        }
        self.0.view_bits::<Lsb0>()[lsb..lsb + width].load_le::<u128>()
    }

    /// Writes `value` into `width` bits starting at bit `lsb`. Bits of `value`
    /// above `width` are dropped.
    pub fn set_bits(&mut self, lsb: usize, width: usize, value: u128) {
        if width == 0 {
            return;
        }
        self.0.view_bits_mut::<Lsb0>()[lsb..lsb + width].store_le::<u128>(value);
    }

    /// 128-bit chunk `index`, counted from the least significant end.
    pub fn chunk(&self, index: usize) -> u128 {
        self.bits(index * 128, 128)
    }

    pub fn set_chunk(&mut self, index: usize, value: u128) {
        self.set_bits(index * 128, 128, value)
    }

    /// Splits the payload into four words, most significant word first.
    pub fn to_words_be(&self) -> [u128; 4] {
        [self.chunk(3), self.chunk(2), self.chunk(1), self.chunk(0)]
    }

    pub fn from_words_be(words: [u128; 4]) -> Self {
        let mut bits = Bits512::ZERO;
        for (i, word) in words.iter().enumerate() {
            bits.set_chunk(3 - i, *word);
        }
        bits
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|limb| *limb == 0)
    }

    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|limb| limb.count_ones()).sum()
    }

    /// XOR of all bits.
    pub fn parity(&self) -> bool {
        self.count_ones() & 1 == 1
    }

    pub fn to_le_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::BYTES {
            return Err(CodecError::Width { what: "payload", expected: Self::BYTES, got: bytes.len() });
        }
        let mut limbs = [0u64; 8];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(raw);
        }
        Ok(Bits512(limbs))
    }
}

impl BitAnd for Bits512 {
    type Output = Bits512;

    fn bitand(self, rhs: Bits512) -> Bits512 {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a &= *b;
        }
        out
    }
}

impl BitXor for Bits512 {
    type Output = Bits512;

    fn bitxor(self, rhs: Bits512) -> Bits512 {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a ^= *b;
        }
        out
    }
}

impl fmt::Debug for Bits512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for limb in self.0.iter().rev() {
            write!(f, "{:016x}", limb)?;
        }
        Ok(())
    }
}

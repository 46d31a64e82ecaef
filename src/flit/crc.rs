//! 16-bit XOR-tree flit CRC.
//!
//! Each CRC bit is the parity of the payload bits selected by one 512-bit
//! coefficient mask. The masks are the columns of `M(x) * x^16 mod G(x)` for
//! the flit generator polynomial, so the whole CRC is linear over GF(2).

use super::bits::Bits512;
use super::error::CodecError;
use super::payload::Flit;

/// Flit CRC generator: x^16 + x^15 + x^14 + x^13 + x^12 + x^6 + x^4 + x + 1.
pub const CRC_POLY: u32 = 0x1F053;

/// Coefficient masks, most significant CRC bit first.
pub static CRC_COEFFICIENTS: [Bits512; 16] = derive_coefficients(CRC_POLY);

const fn derive_coefficients(poly: u32) -> [Bits512; 16] {
    let mut rows = [[0u64; 8]; 16];
    // x^(i+16) mod G, starting from i = 0
    let mut rem = poly & 0xffff;
    let mut i = 0;
    while i < Bits512::BITS {
        let mut j = 0;
        while j < 16 {
            if (rem >> j) & 1 == 1 {
                rows[15 - j][i / 64] |= 1u64 << (i % 64);
            }
            j += 1;
        }
        rem <<= 1;
        if rem & 0x1_0000 != 0 {
            rem ^= poly;
        }
        i += 1;
    }
    let mut out = [Bits512::ZERO; 16];
    let mut k = 0;
    while k < 16 {
        out[k] = Bits512::from_limbs(rows[k]);
        k += 1;
    }
    out
}

/// Parity of `payload & coeffs[k]` for every k, `coeffs[0]` giving the MSB.
pub fn crc16(payload: &Bits512, coeffs: &[Bits512; 16]) -> u16 {
    coeffs
        .iter()
        .fold(0u16, |crc, mask| (crc << 1) | (*payload & *mask).parity() as u16)
}

/// Attaches the CRC computed with `coeffs` above `payload`.
pub fn apply_crc(payload: &Bits512, coeffs: &[Bits512; 16]) -> Flit {
    Flit { crc: crc16(payload, coeffs), payload: *payload }
}

/// Loads a coefficient table from 16 consecutive 64-byte little-endian rows.
pub fn coefficients_from_bytes(bytes: &[u8]) -> Result<[Bits512; 16], CodecError> {
    if bytes.len() != 16 * Bits512::BYTES {
        return Err(CodecError::Width { what: "crc table", expected: 16 * Bits512::BYTES, got: bytes.len() });
    }
    let mut table = [Bits512::ZERO; 16];
    for (row, chunk) in table.iter_mut().zip(bytes.chunks_exact(Bits512::BYTES)) {
        *row = Bits512::from_le_bytes(chunk)?;
    }
    Ok(table)
}

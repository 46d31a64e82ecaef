use cxlsim_flit::flit::*;
use proptest::prelude::*;

fn payload_from(limbs: [u64; 8]) -> Bits512 {
    Bits512::from_limbs(limbs)
}

#[test]
fn test_crc_of_zero_payload() {
    assert_eq!(crc16(&Bits512::ZERO, &CRC_COEFFICIENTS), 0);
    assert!(CRC_COEFFICIENTS.iter().all(|row| !row.is_zero()));
}

#[test]
fn test_single_bit_crc_matches_polynomial() {
    // bit 0 alone gives x^16 mod G, the low 16 bits of the generator
    let mut bits = Bits512::ZERO;
    bits.set_bits(0, 1, 1);
    assert_eq!(crc16(&bits, &CRC_COEFFICIENTS), (CRC_POLY & 0xffff) as u16);
}

#[test]
fn test_seal_and_check() {
    let flit = Flit::seal(ControlFlit::retry_idle(64).to_payload());
    assert!(flit.check().is_ok());

    let mut bad = flit;
    bad.crc ^= 0x0100;
    assert_eq!(bad.check(), Err(CodecError::Crc { carried: bad.crc, computed: flit.crc }));

    let mut flipped = flit;
    flipped.payload.set_bits(300, 1, 1);
    assert!(flipped.check().is_err());
}

#[test]
fn test_flit_bytes() {
    let flit = Flit::seal(payload_from([1, 2, 3, 4, 5, 6, 7, 8]));
    let bytes = flit.to_bytes();
    assert_eq!(bytes.len(), Flit::BYTES);
    assert_eq!(bytes[0], 1);
    assert_eq!(u16::from_le_bytes([bytes[64], bytes[65]]), flit.crc);
    assert_eq!(Flit::from_bytes(&bytes), Ok(flit));
}

#[test]
fn test_coefficients_from_bytes() {
    let mut raw = Vec::new();
    for row in CRC_COEFFICIENTS.iter() {
        raw.extend_from_slice(&row.to_le_bytes());
    }
    let table = coefficients_from_bytes(&raw).unwrap();
    assert_eq!(table, CRC_COEFFICIENTS);
    assert!(coefficients_from_bytes(&raw[1..]).is_err());
}

#[test]
fn test_apply_crc_with_custom_table() {
    // a table selecting one payload bit per CRC bit copies those bits out
    let mut table = [Bits512::ZERO; 16];
    for (k, row) in table.iter_mut().enumerate() {
        row.set_bits(15 - k, 1, 1);
    }
    let mut payload = Bits512::ZERO;
    payload.set_bits(0, 16, 0xbeef);
    assert_eq!(apply_crc(&payload, &table).crc, 0xbeef);
}

proptest! {
    #[test]
    fn prop_crc_is_linear(a: [u64; 8], b: [u64; 8]) {
        let (a, b) = (payload_from(a), payload_from(b));
        let lhs = crc16(&(a ^ b), &CRC_COEFFICIENTS);
        let rhs = crc16(&a, &CRC_COEFFICIENTS) ^ crc16(&b, &CRC_COEFFICIENTS);
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn prop_any_single_bit_flip_is_detected(limbs: [u64; 8], bit in 0usize..512) {
        let flit = Flit::seal(payload_from(limbs));
        let mut bad = flit;
        let old = bad.payload.bits(bit, 1);
        bad.payload.set_bits(bit, 1, old ^ 1);
        prop_assert!(bad.check().is_err());
    }
}

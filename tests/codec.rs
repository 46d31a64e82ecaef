use std::fmt::Debug;

use cxlsim_flit::flit::schema::mask;
use cxlsim_flit::flit::*;
use proptest::prelude::*;

/// Every in-width bit pattern unpacks to a record that packs back to it.
fn roundtrip<R: Record + PartialEq + Debug>(raw: u128) -> Result<(), TestCaseError> {
    let bits = raw & mask(R::WIDTH);
    let record = R::unpack(bits);
    prop_assert_eq!(record.pack(), bits);
    prop_assert_eq!(R::unpack(record.pack()), record);
    Ok(())
}

#[test]
fn test_h2d_rsp_pack_unpack() {
    let rsp = H2dRsp {
        opcode: H2dRspOpcode::Go as u8,
        cqid: 0x123,
        rsp_data: CacheState::Shared as u16,
        valid: true,
        ..Default::default()
    };
    let bits = rsp.pack();
    assert_eq!(bits & 1, 1, "valid is bit 0");
    assert_eq!(H2dRsp::unpack(bits), rsp);
    assert_eq!(H2dRsp::new(H2dRspOpcode::Go, CacheState::Shared, 0x123), rsp);
}

#[test]
fn test_header_widths() {
    assert_eq!(D2hReq::WIDTH, 79);
    assert_eq!(D2hRsp::WIDTH, 20);
    assert_eq!(D2hDataHeader::WIDTH, 17);
    assert_eq!(H2dReq::WIDTH, 64);
    assert_eq!(H2dRsp::WIDTH, 32);
    assert_eq!(H2dDataHeader::WIDTH, 24);
    assert_eq!(M2sReq::WIDTH, 87);
    assert_eq!(M2sRwd::WIDTH, 87);
    assert_eq!(S2mNdr::WIDTH, 30);
    assert_eq!(S2mDrs::WIDTH, 40);
    assert_eq!(FlitHeader::WIDTH, 32);
}

#[test]
fn test_layout_locate() {
    let layout = H2dRsp::LAYOUT;
    assert_eq!(layout.locate("valid"), Some((0, 1)));
    assert_eq!(layout.locate("opcode"), Some((1, 4)));
    assert_eq!(layout.locate("rsp_data"), Some((5, 12)));
    assert_eq!(layout.locate("cqid"), Some((19, 12)));
    assert_eq!(layout.locate("missing"), None);
}

#[test]
fn test_pack_masks_overflowing_values() {
    let rsp = H2dRsp { opcode: 0xff, valid: true, ..Default::default() };
    let back = H2dRsp::unpack(rsp.pack());
    assert_eq!(back.opcode, 0x0f);
    assert_eq!(back.cqid, 0);
}

#[test]
fn test_nested_slot_layout() {
    let rsp0 = H2dRsp::new(H2dRspOpcode::Go, CacheState::Exclusive, 7);
    let slot = downstream::H1 {
        data_header: H2dDataHeader::new(3),
        rsp0,
        ..Default::default()
    };
    let bits = slot.pack();
    let (lsb, width) = downstream::H1::LAYOUT.locate("rsp0").unwrap();
    assert_eq!((bits >> lsb) & ((1u128 << width) - 1), rsp0.pack());
    assert_eq!(downstream::H1::unpack(bits), slot);
}

#[test]
fn test_flit_header_formats() {
    let header = FlitHeader::with_formats(HFormat::H3, [GFormat::G0, GFormat::G1, GFormat::G2]);
    let back = FlitHeader::unpack(header.pack());
    assert!(!back.is_control());
    assert_eq!(back.formats(), (HFormat::H3, [GFormat::G0, GFormat::G1, GFormat::G2]));
}

#[test]
fn test_protocol_flit_slot_positions() {
    let flit = ProtocolFlit::new(
        HFormat::H1,
        0xabc,
        [(GFormat::G0, 1), (GFormat::G0, 2), (GFormat::G0, 3)],
    );
    let payload = flit.to_payload();
    assert_eq!(payload.bits(32, 96), 0xabc);
    assert_eq!(payload.chunk(1), 1);
    assert_eq!(payload.chunk(2), 2);
    assert_eq!(payload.chunk(3), 3);
    assert_eq!(ProtocolFlit::from_payload(&payload), flit);
}

#[test]
fn test_bytes_width_error() {
    let err = Flit::from_bytes(&[0u8; 65]).unwrap_err();
    assert_eq!(err, CodecError::Width { what: "flit", expected: 66, got: 65 });
    assert!(Bits512::from_le_bytes(&[0u8; 3]).is_err());
}

#[test]
fn test_line_words() {
    let mut line = [0u8; 64];
    line[0] = 0x01;
    line[63] = 0xff;
    let words = line_to_words(&line);
    assert_eq!(words[0], 1);
    assert_eq!(words[3] >> 120, 0xff);
    assert_eq!(words_to_line(&words), line);
}

#[test]
fn test_control_flit_fields() {
    let ctrl = ControlFlit::init_param(64);
    let back = ControlFlit::from_payload(&ctrl.to_payload());
    assert_eq!(back, ctrl);
    assert_eq!(back.kind(), ControlKind::InitParam);
    assert_eq!(back.param().llr_wrap, 64);
    assert_eq!(back.param().version, PROTOCOL_VERSION);

    let credits = Credits::ret(CreditChannel::Mem, 7);
    assert_eq!(credits.rsp, 0b1111);
    let ack = ControlFlit::from_payload(&ControlFlit::llcrd_ack(credits).to_payload());
    assert_eq!(ack.kind(), ControlKind::LlcrdAck);
    assert_eq!(ack.credits, credits);
}

proptest! {
    #[test]
    fn prop_d2h_req_roundtrip(
        address in 0u64..(1 << 46),
        cqid in 0u16..(1 << 12),
        opcode in 0u8..32,
        nt: bool,
        valid: bool,
    ) {
        let req = D2hReq { address, cqid, opcode, nt, valid, ..Default::default() };
        prop_assert!(req.pack() < (1u128 << 79));
        prop_assert_eq!(D2hReq::unpack(req.pack()), req);
    }

    #[test]
    fn prop_bits_set_get(lsb in 0usize..384, width in 1usize..=128, value: u128) {
        let mut bits = Bits512::ZERO;
        bits.set_bits(lsb, width, value);
        let expected = if width == 128 { value } else { value & ((1u128 << width) - 1) };
        prop_assert_eq!(bits.bits(lsb, width), expected);
        prop_assert_eq!(bits.count_ones(), expected.count_ones());
    }

    #[test]
    fn prop_message_headers_roundtrip(raw: u128) {
        roundtrip::<D2hReq>(raw)?;
        roundtrip::<D2hRsp>(raw)?;
        roundtrip::<D2hDataHeader>(raw)?;
        roundtrip::<H2dReq>(raw)?;
        roundtrip::<H2dRsp>(raw)?;
        roundtrip::<H2dDataHeader>(raw)?;
        roundtrip::<M2sReq>(raw)?;
        roundtrip::<M2sRwd>(raw)?;
        roundtrip::<S2mNdr>(raw)?;
        roundtrip::<S2mDrs>(raw)?;
        roundtrip::<FlitHeader>(raw)?;
        roundtrip::<ControlSlot>(raw)?;
        roundtrip::<ParamPayload>(raw)?;
    }

    #[test]
    fn prop_downstream_slots_roundtrip(raw: u128) {
        use downstream::*;
        roundtrip::<H0>(raw)?;
        roundtrip::<H1>(raw)?;
        roundtrip::<H2>(raw)?;
        roundtrip::<H3>(raw)?;
        roundtrip::<H4>(raw)?;
        roundtrip::<H5>(raw)?;
        roundtrip::<H6>(raw)?;
        roundtrip::<G1>(raw)?;
        roundtrip::<G2>(raw)?;
        roundtrip::<G3>(raw)?;
        roundtrip::<G4>(raw)?;
        roundtrip::<G5>(raw)?;
        roundtrip::<G6>(raw)?;
    }

    #[test]
    fn prop_upstream_slots_roundtrip(raw: u128) {
        use upstream::*;
        roundtrip::<H0>(raw)?;
        roundtrip::<H1>(raw)?;
        roundtrip::<H2>(raw)?;
        roundtrip::<H3>(raw)?;
        roundtrip::<H4>(raw)?;
        roundtrip::<H5>(raw)?;
        roundtrip::<H6>(raw)?;
        roundtrip::<G1>(raw)?;
        roundtrip::<G2>(raw)?;
        roundtrip::<G3>(raw)?;
        roundtrip::<G4>(raw)?;
        roundtrip::<G5>(raw)?;
        roundtrip::<G6>(raw)?;
    }
}

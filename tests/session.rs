use std::time::Duration;

use cxlsim_flit::flit::*;
use cxlsim_flit::link::*;

fn session(mode: PeerMode) -> (LinkSession, SharedMemory) {
    session_with(LinkSpec::default(), mode)
}

fn session_with(spec: LinkSpec, mode: PeerMode) -> (LinkSession, SharedMemory) {
    let _ = env_logger::builder().is_test(true).try_init();
    let memory = SparseMemory::new().shared();
    (LinkSession::new(spec, mode, memory.clone()), memory)
}

fn linked() -> (LinkSession, SharedMemory) {
    let (mut s, memory) = session(PeerMode::Echo);
    s.start();
    assert_eq!(s.run_init(1000), Some(Ok(())));
    // let the credit returns go out
    s.run(20);
    (s, memory)
}

fn device_req(opcode: D2hReqOpcode, cqid: u16) -> D2hReq {
    D2hReq { address: 0x40, cqid, opcode: opcode as u8, valid: true, ..Default::default() }
}

fn host_rsps(flits: &[Flit]) -> Vec<H2dRsp> {
    let mut out = Vec::new();
    for flit in flits {
        let p = ProtocolFlit::from_payload(&flit.payload);
        if p.header.is_control() || p.header.h_format() != HFormat::H1 {
            continue;
        }
        let h1 = downstream::H1::unpack(p.slot0);
        out.extend([h1.rsp0, h1.rsp1].into_iter().filter(|r| r.valid));
    }
    out
}

#[test]
fn test_echo_peer_brings_link_up() {
    let (s, _) = linked();
    let log = s.log();
    // RETRY.Idle, INIT.Param, 14 credit returns
    assert_eq!(log.tx.len(), 16);
    let kinds: Vec<_> = log.tx.iter().map(|f| ControlFlit::from_payload(&f.payload).kind()).collect();
    assert_eq!(kinds[0], ControlKind::RetryIdle);
    assert_eq!(kinds[1], ControlKind::InitParam);
    assert!(kinds[2..].iter().all(|k| *k == ControlKind::LlcrdAck));
    assert!(log.errors.is_empty());
}

#[test]
fn test_silent_peer_times_out() {
    let (mut s, _) = session(PeerMode::Silent);
    s.start();
    assert_eq!(s.run_init(200), None);
    s.advance(Duration::from_micros(2));
    assert_eq!(
        s.init_outcome(),
        Some(Err(LinkInitError::Timeout { state: InitState::WaitRetryIdle }))
    );
    // only the RETRY.Idle went out
    assert_eq!(s.log().tx.len(), 1);
}

#[test]
fn test_zero_startup_delay_starts_at_once() {
    let spec = LinkSpec { startup_delay: Duration::ZERO, ..Default::default() };
    let (mut s, _) = session_with(spec, PeerMode::Echo);
    s.start();
    assert_eq!(s.run_init(10), Some(Ok(())));
    s.run(20);
    assert_eq!(s.log().tx.len(), 16);
}

#[test]
fn test_zero_init_timeout_fails_instead_of_hanging() {
    let spec = LinkSpec { init_timeout: Duration::ZERO, ..Default::default() };
    let (mut s, _) = session_with(spec, PeerMode::Silent);
    s.start();
    assert_eq!(
        s.run_init(500),
        Some(Err(LinkInitError::Timeout { state: InitState::WaitRetryIdle }))
    );
}

#[test]
fn test_garbled_peer_fails_init() {
    let (mut s, _) = session(PeerMode::Garbled);
    s.start();
    assert_eq!(
        s.run_init(1000),
        Some(Err(LinkInitError::Unexpected {
            state: InitState::WaitRetryIdle,
            kind: ControlKind::RetryReq,
        }))
    );
}

#[test]
fn test_mem_wr_end_to_end() {
    let (mut s, memory) = linked();
    let sent = s.log().tx.len();

    s.inject(request_flit(device_req(D2hReqOpcode::MemWr, 0x21)));
    s.run(2);
    let rsps = host_rsps(&s.log().tx[sent..]);
    assert_eq!(rsps, vec![H2dRsp::new(H2dRspOpcode::GoWritePull, CacheState::Invalid, 0x21)]);

    let mut line = [0u8; 64];
    line[5] = 0x55;
    line[60] = 0xaa;
    let header = D2hDataHeader { uqid: 0x21, valid: true, ..Default::default() };
    for flit in data_flits(header, line_to_words(&line)) {
        s.inject(flit);
    }

    let log = s.log();
    assert_eq!(log.lines.len(), 1);
    assert_eq!(log.lines[0].written, Some(0x1000));
    assert_eq!(memory.lock().unwrap().read(0x1000, 64), line.to_vec());
    assert!(log.errors.is_empty());
}

#[test]
fn test_rd_shared_sends_response_then_line() {
    let (mut s, memory) = linked();
    let mut line = [0u8; 64];
    line[0] = 0x11;
    memory.lock().unwrap().write(0x1000, &line);
    let sent = s.log().tx.len();

    s.inject(request_flit(device_req(D2hReqOpcode::RdShared, 0x33)));
    s.run(4);

    let log = s.log();
    let tx = &log.tx[sent..];
    assert_eq!(tx.len(), 2);
    let first = ProtocolFlit::from_payload(&tx[0].payload);
    assert_eq!(first.header.formats(), (HFormat::H1, [GFormat::G0; 3]));
    let h1 = downstream::H1::unpack(first.slot0);
    assert_eq!(h1.rsp0, H2dRsp::new(H2dRspOpcode::Go, CacheState::Shared, 0x33));
    assert_eq!(h1.data_header, H2dDataHeader::new(0x33));

    let words = line_to_words(&line);
    assert_eq!(first.slots, [words[0], words[1], words[2]]);
    let second = ProtocolFlit::from_payload(&tx[1].payload);
    assert_eq!(second.slots[0], words[3]);
}

#[test]
fn test_corrupted_flit_is_reported() {
    let (mut s, _) = linked();
    let mut flit = request_flit(device_req(D2hReqOpcode::RdCurr, 1));
    flit.crc ^= 1;
    s.inject(flit);
    s.run(2);

    let log = s.log();
    assert_eq!(log.errors.len(), 1);
    assert!(matches!(log.errors[0], DecodeError::Codec(CodecError::Crc { .. })));
    assert_eq!(log.tx.len(), 16);
}

#[test]
fn test_device_responses_are_logged() {
    let (mut s, _) = linked();
    let rsp = D2hRsp { uqid: 4, opcode: 1, valid: true, ..Default::default() };
    let g1 = upstream::G1 { rsp0: rsp, ..Default::default() };
    let payload = ProtocolFlit::new(HFormat::H1, 0, [(GFormat::G1, g1.pack()), (GFormat::G1, 0), (GFormat::G1, 0)]);
    s.inject(Flit::seal(payload.to_payload()));
    assert_eq!(s.log().responses, vec![UpstreamRsp::Cache(rsp)]);
}

use env_logger::Env;
use log::{error, info};

use cxlsim_flit::flit::*;
use cxlsim_flit::link::*;

const DEMO_LINE: u64 = 0x40; // line index, byte address 0x1000
const WRITE_CQID: u16 = 0x11;
const READ_CQID: u16 = 0x12;

fn main() {
    // logging
    let env = Env::default()
        .filter_or("CXL_LOG_LEVEL", "info")
        .write_style_or("CXL_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let spec = LinkSpec::default();
    let memory = SparseMemory::new().shared();
    let mut session = LinkSession::new(spec, PeerMode::Echo, memory);

    // link init
    session.start();
    match session.run_init(10_000) {
        Some(Ok(())) => info!("link up at {:?}", session.time()),
        Some(Err(e)) => {
            error!("link init failed: {}", e);
            std::process::exit(1);
        }
        None => {
            error!("link init did not finish");
            std::process::exit(1);
        }
    }

    // device writes a line back: request, GO_WritePull, then the data
    let write = D2hReq {
        address: DEMO_LINE,
        cqid: WRITE_CQID,
        opcode: D2hReqOpcode::MemWr as u8,
        valid: true,
        ..Default::default()
    };
    session.inject(request_flit(write));
    session.run(4);

    let mut line = [0u8; 64];
    for (i, byte) in line.iter_mut().enumerate() {
        *byte = i as u8;
    }
    let header = D2hDataHeader { uqid: WRITE_CQID, valid: true, ..Default::default() };
    for flit in data_flits(header, line_to_words(&line)) {
        session.inject(flit);
    }

    // device reads the same line back
    let read = D2hReq {
        address: DEMO_LINE,
        cqid: READ_CQID,
        opcode: D2hReqOpcode::RdShared as u8,
        valid: true,
        ..Default::default()
    };
    session.inject(request_flit(read));
    session.run(8);

    // print stats
    let log = session.log();
    println!("finished at {:?}", session.time());
    println!("host flits sent:      {}", log.tx.len());
    println!("lines from device:    {}", log.lines.len());
    println!("lines written back:   {}", log.lines.iter().filter(|l| l.written.is_some()).count());
    println!("decode errors:        {}", log.errors.len());
}

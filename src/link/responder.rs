use std::collections::{HashMap, VecDeque};

use asynchronix::model::{Model, Output};
use log::{debug, info, warn};

use crate::flit::*;
use super::common::{LINE_BYTES, LINE_WORDS};
use super::host::SharedMemory;

/// A write the host expects the device to push data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPull {
    pub uqid: u16,
    pub line_address: u64,
}

/// Output of the responder for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Rsp(H2dRsp),
    Data(H2dDataHeader, LineWords),
    Pull(DataPull),
}

/// Host-side answers to device requests.
pub struct RequestResponder {
    memory: SharedMemory,
    pub o_rsp: Output<H2dRsp>,
    pub o_data: Output<(H2dDataHeader, LineWords)>,
    pub o_pull: Output<DataPull>,
}

impl RequestResponder {
    pub fn new(memory: SharedMemory) -> Self {
        RequestResponder {
            memory,
            o_rsp: Output::new(),
            o_data: Output::new(),
            o_pull: Output::new(),
        }
    }

    fn read_line(&self, line_address: u64) -> LineWords {
        let mut bytes = match self.memory.lock() {
            Ok(mut memory) => memory.read(line_address, LINE_BYTES),
            Err(poisoned) => poisoned.into_inner().read(line_address, LINE_BYTES),
        };
        if bytes.len() != LINE_BYTES {
            warn!("host read of {:#x} returned {} bytes", line_address, bytes.len());
            bytes.resize(LINE_BYTES, 0);
        }
        let mut line = [0u8; 64];
        line.copy_from_slice(&bytes[..LINE_BYTES]);
        line_to_words(&line)
    }

    fn line_reply(&self, req: &D2hReq) -> Reply {
        Reply::Data(H2dDataHeader::new(req.cqid), self.read_line(req.line_address()))
    }

    /// Replies for one request, in the order they must be sent.
    pub fn respond(&mut self, req: &D2hReq) -> Vec<Reply> {
        use CacheState::*;
        use D2hReqOpcode::*;
        use H2dRspOpcode::*;

        let rsp = |opcode, state| Reply::Rsp(H2dRsp::new(opcode, state, req.cqid));
        match req.opcode() {
            Some(MemWr) => vec![
                rsp(GoWritePull, Invalid),
                Reply::Pull(DataPull { uqid: req.cqid, line_address: req.line_address() }),
            ],
            Some(RdCurr) => vec![self.line_reply(req)],
            Some(RdShared) => vec![rsp(Go, Shared), self.line_reply(req)],
            Some(CleanEvictNoData) => vec![rsp(Go, Invalid)],
            Some(DirtyEvict) => vec![rsp(GoWritePull, Invalid)],
            Some(RdOwnNoData) => vec![rsp(Go, Exclusive)],
            // TODO: confirm with the protocol owners whether an unhandled
            // opcode should get an error response instead of being dropped.
            other => {
                warn!("unhandled request {:?} (opcode {:#07b}), dropped", other, req.opcode);
                vec![]
            }
        }
    }

    // inputs

    pub async fn on_request(&mut self, req: D2hReq) {
        debug!("request {:?} cqid {:#x}", req.opcode(), req.cqid);
        for reply in self.respond(&req) {
            match reply {
                Reply::Rsp(rsp) => self.o_rsp.send(rsp).await,
                Reply::Data(header, words) => self.o_data.send((header, words)).await,
                Reply::Pull(pull) => self.o_pull.send(pull).await,
            }
        }
    }
}

impl Model for RequestResponder {}

/// A data header joined with its four words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledLine {
    pub header: UpstreamDataHeader,
    pub line: [u8; 64],
    /// Address written to host memory, if the line answered a data pull.
    pub written: Option<u64>,
}

/// Reassembles inbound data headers with their data words and commits pulled
/// lines to host memory.
pub struct LineAssembler {
    memory: SharedMemory,
    pulls: HashMap<u16, u64>,
    headers: VecDeque<UpstreamDataHeader>,
    words: VecDeque<u128>,
    pub o_line: Output<AssembledLine>,
}

impl LineAssembler {
    pub fn new(memory: SharedMemory) -> Self {
        LineAssembler {
            memory,
            pulls: HashMap::new(),
            headers: VecDeque::new(),
            words: VecDeque::new(),
            o_line: Output::new(),
        }
    }

    pub fn expect_pull(&mut self, pull: DataPull) {
        self.pulls.insert(pull.uqid, pull.line_address);
    }

    pub fn push_header(&mut self, header: UpstreamDataHeader) {
        self.headers.push_back(header);
    }

    pub fn push_word(&mut self, word: u128) {
        self.words.push_back(word);
    }

    pub fn pending_pulls(&self) -> usize {
        self.pulls.len()
    }

    /// Completes every line whose four words have arrived.
    pub fn assemble(&mut self) -> Vec<AssembledLine> {
        let mut done = Vec::new();
        while !self.headers.is_empty() && self.words.len() >= LINE_WORDS {
            let Some(header) = self.headers.pop_front() else { break };
            let mut words = [0u128; 4];
            for word in words.iter_mut() {
                *word = self.words.pop_front().unwrap_or_default();
            }
            let line = words_to_line(&words);
            let written = match header {
                UpstreamDataHeader::Cache(dh) => self.pulls.remove(&dh.uqid),
                UpstreamDataHeader::Mem(_) => None,
            };
            match (header, written) {
                (_, Some(address)) => {
                    info!("line {:#x} written back", address);
                    match self.memory.lock() {
                        Ok(mut memory) => memory.write(address, &line),
                        Err(poisoned) => poisoned.into_inner().write(address, &line),
                    }
                }
                (UpstreamDataHeader::Mem(drs), None) => debug!("DRS data for tag {:#x}", drs.tag),
                (UpstreamDataHeader::Cache(dh), None) => {
                    warn!("data for uqid {:#x} matches no pull, dropped", dh.uqid)
                }
            }
            done.push(AssembledLine { header, line, written });
        }
        done
    }

    async fn flush(&mut self) {
        for line in self.assemble() {
            self.o_line.send(line).await;
        }
    }

    // inputs

    pub fn on_pull(&mut self, pull: DataPull) {
        self.expect_pull(pull);
    }

    pub async fn on_header(&mut self, header: UpstreamDataHeader) {
        self.push_header(header);
        self.flush().await;
    }

    pub async fn on_data(&mut self, word: u128) {
        self.push_word(word);
        self.flush().await;
    }
}

impl Model for LineAssembler {}

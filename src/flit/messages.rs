//! CXL.cache and CXL.mem message headers.
//!
//! Field lists run most significant first; `valid` is always bit 0.

use super::control::ControlFlit;
use super::schema::record;

record! {
    /// Device-to-host request (79 bits).
    pub struct D2hReq : "D2H Req" {
        address: u64 = 46,
        rsvd: u16 = 14,
        nt: bool = 1,
        cqid: u16 = 12,
        opcode: u8 = 5,
        valid: bool = 1,
    }
}

record! {
    /// Device-to-host response (20 bits).
    pub struct D2hRsp : "D2H Rsp" {
        rsvd: u8 = 2,
        uqid: u16 = 12,
        opcode: u8 = 5,
        valid: bool = 1,
    }
}

record! {
    /// Device-to-host data header (17 bits).
    pub struct D2hDataHeader : "D2H DH" {
        rsvd: bool = 1,
        poison: bool = 1,
        bogus: bool = 1,
        chunk_valid: bool = 1,
        uqid: u16 = 12,
        valid: bool = 1,
    }
}

record! {
    /// Host-to-device request, i.e. a snoop (64 bits).
    pub struct H2dReq : "H2D Req" {
        rsvd: u8 = 2,
        uqid: u16 = 12,
        address: u64 = 46,
        opcode: u8 = 3,
        valid: bool = 1,
    }
}

record! {
    /// Host-to-device response (32 bits).
    pub struct H2dRsp : "H2D Rsp" {
        rsvd: bool = 1,
        cqid: u16 = 12,
        rsp_pre: u8 = 2,
        rsp_data: u16 = 12,
        opcode: u8 = 4,
        valid: bool = 1,
    }
}

record! {
    /// Host-to-device data header (24 bits).
    pub struct H2dDataHeader : "H2D DH" {
        rsvd: u8 = 8,
        go_err: bool = 1,
        poison: bool = 1,
        chunk_valid: bool = 1,
        cqid: u16 = 12,
        valid: bool = 1,
    }
}

record! {
    /// Master-to-subordinate request without data (87 bits).
    pub struct M2sReq : "M2S Req" {
        rsvd: u16 = 10,
        tc: u8 = 2,
        address: u64 = 47,
        tag: u16 = 16,
        meta_value: u8 = 2,
        meta_field: u8 = 2,
        snp_type: u8 = 3,
        mem_opcode: u8 = 4,
        valid: bool = 1,
    }
}

record! {
    /// Master-to-subordinate request with data, header part (87 bits).
    pub struct M2sRwd : "M2S RwD" {
        rsvd: u16 = 10,
        tc: u8 = 2,
        poison: bool = 1,
        address: u64 = 46,
        tag: u16 = 16,
        meta_value: u8 = 2,
        meta_field: u8 = 2,
        snp_type: u8 = 3,
        mem_opcode: u8 = 4,
        valid: bool = 1,
    }
}

record! {
    /// Subordinate-to-master no-data response (30 bits).
    pub struct S2mNdr : "S2M NDR" {
        rsvd: u8 = 2,
        ld_id: u8 = 4,
        tag: u16 = 16,
        meta_value: u8 = 2,
        meta_field: u8 = 2,
        opcode: u8 = 3,
        valid: bool = 1,
    }
}

record! {
    /// Subordinate-to-master data response header (40 bits).
    pub struct S2mDrs : "S2M DRS" {
        rsvd: u16 = 11,
        ld_id: u8 = 4,
        poison: bool = 1,
        tag: u16 = 16,
        meta_value: u8 = 2,
        meta_field: u8 = 2,
        opcode: u8 = 3,
        valid: bool = 1,
    }
}

/// D2H request opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum D2hReqOpcode {
    RdCurr = 0b00001,
    RdOwn = 0b00010,
    RdShared = 0b00011,
    RdAny = 0b00100,
    RdOwnNoData = 0b00101,
    ItoMWr = 0b00110,
    MemWr = 0b00111,
    ClFlush = 0b01000,
    CleanEvict = 0b01001,
    DirtyEvict = 0b01010,
    CleanEvictNoData = 0b01011,
    WoWrInv = 0b01100,
    WoWrInvF = 0b01101,
    WrInv = 0b01110,
    CacheFlushed = 0b10000,
}

impl D2hReqOpcode {
    pub fn from_bits(bits: u8) -> Option<Self> {
        use D2hReqOpcode::*;
        [
            RdCurr, RdOwn, RdShared, RdAny, RdOwnNoData, ItoMWr, MemWr, ClFlush,
            CleanEvict, DirtyEvict, CleanEvictNoData, WoWrInv, WoWrInvF, WrInv, CacheFlushed,
        ]
        .into_iter()
        .find(|op| *op as u8 == bits)
    }
}

/// H2D response opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum H2dRspOpcode {
    WritePull = 0b0001,
    Go = 0b0100,
    GoWritePull = 0b0101,
    ExtCmp = 0b0110,
    GoWritePullDrop = 0b1000,
    FastGo = 0b1100,
    FastGoWritePull = 0b1101,
    GoErrWritePull = 0b1111,
}

/// Cache state granted by a GO response, carried in `rsp_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CacheState {
    Shared = 0b0001,
    Exclusive = 0b0010,
    Invalid = 0b0011,
    Error = 0b0100,
    Modified = 0b0110,
}

impl D2hReq {
    pub fn opcode(&self) -> Option<D2hReqOpcode> {
        D2hReqOpcode::from_bits(self.opcode)
    }

    /// Byte address of the cache line.
    pub fn line_address(&self) -> u64 {
        self.address << 6
    }
}

impl H2dRsp {
    pub fn new(opcode: H2dRspOpcode, state: CacheState, cqid: u16) -> Self {
        H2dRsp {
            cqid,
            rsp_data: state as u16,
            opcode: opcode as u8,
            valid: true,
            ..Default::default()
        }
    }
}

impl H2dDataHeader {
    pub fn new(cqid: u16) -> Self {
        H2dDataHeader { cqid, valid: true, ..Default::default() }
    }
}

/// Four 128-bit words of one 64-byte cache line, in transfer order.
pub type LineWords = [u128; 4];

pub fn line_to_words(line: &[u8; 64]) -> LineWords {
    let mut words = [0u128; 4];
    for (word, chunk) in words.iter_mut().zip(line.chunks_exact(16)) {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(chunk);
        *word = u128::from_le_bytes(raw);
    }
    words
}

pub fn words_to_line(words: &LineWords) -> [u8; 64] {
    let mut line = [0u8; 64];
    for (chunk, word) in line.chunks_exact_mut(16).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    line
}

/// Response-class message received from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamRsp {
    Cache(D2hRsp),
    Mem(S2mNdr),
}

/// Data header received from the device. Each one owns the next four data words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamDataHeader {
    Cache(D2hDataHeader),
    Mem(S2mDrs),
}

/// One demultiplexed item of an inbound flit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upstream {
    Request(D2hReq),
    Response(UpstreamRsp),
    DataHeader(UpstreamDataHeader),
    Data(u128),
    Control(ControlFlit),
}

impl From<D2hReq> for Upstream {
    fn from(req: D2hReq) -> Self {
        Upstream::Request(req)
    }
}

impl From<D2hRsp> for Upstream {
    fn from(rsp: D2hRsp) -> Self {
        Upstream::Response(UpstreamRsp::Cache(rsp))
    }
}

impl From<S2mNdr> for Upstream {
    fn from(ndr: S2mNdr) -> Self {
        Upstream::Response(UpstreamRsp::Mem(ndr))
    }
}

impl From<D2hDataHeader> for Upstream {
    fn from(dh: D2hDataHeader) -> Self {
        Upstream::DataHeader(UpstreamDataHeader::Cache(dh))
    }
}

impl From<S2mDrs> for Upstream {
    fn from(drs: S2mDrs) -> Self {
        Upstream::DataHeader(UpstreamDataHeader::Mem(drs))
    }
}

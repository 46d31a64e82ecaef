//! Link-layer control flits (LLCRD, RETRY, INIT, IDE).
//!
//! A control flit reuses the protocol flit header with `flit_type` set; the
//! slot 0 format field carries `ctl_fmt`. Slot 0 holds `llctrl`, `sub_type`, a
//! must-be-zero field and a 64-bit payload. Slots 1 to 3 are unused.

use super::bits::Bits512;
use super::payload::FlitHeader;
use super::schema::{record, Record};

pub const CTL_FMT_LINK: u8 = 0b000;
pub const CTL_FMT_IDE: u8 = 0b001;

pub const LLCTRL_LLCRD: u8 = 0b0000;
pub const LLCTRL_RETRY: u8 = 0b0001;
pub const LLCTRL_IDE: u8 = 0b0010;
pub const LLCTRL_INIT: u8 = 0b1100;

pub const LLCRD_ACK: u8 = 0b0001;

pub const RETRY_IDLE: u8 = 0b0000;
pub const RETRY_REQ: u8 = 0b0001;
pub const RETRY_ACK: u8 = 0b0010;
pub const RETRY_FRAME: u8 = 0b0011;

pub const INIT_PARAM: u8 = 0b1000;

/// Link protocol version advertised in RETRY.Idle and INIT.Param.
pub const PROTOCOL_VERSION: u8 = 0b0010;

record! {
    /// Slot 0 of a control flit.
    pub struct ControlSlot : "CTRL slot" {
        payload: u64 = 64,
        rsvd: u32 = 24,
        sub_type: u8 = 4,
        llctrl: u8 = 4,
    }
}

record! {
    /// Payload of RETRY.Idle and INIT.Param.
    pub struct ParamPayload : "INIT param" {
        rsvd1: u64 = 48,
        llr_wrap: u8 = 8,
        rsvd0: u8 = 4,
        version: u8 = 4,
    }
}

const _: () = assert!(ControlSlot::WIDTH == 96 && ParamPayload::WIDTH == 64);

/// Credit bucket selector, carried in bit 3 of each header credit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditChannel {
    Cache,
    Mem,
}

/// Credit fields of the flit header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Credits {
    pub rsp: u8,
    pub req: u8,
    pub data: u8,
}

impl Credits {
    /// Returns `count` credits of every kind to one channel.
    pub fn ret(channel: CreditChannel, count: u8) -> Self {
        let sel = match channel {
            CreditChannel::Cache => 0,
            CreditChannel::Mem => 0b1000,
        };
        let field = sel | (count & 0b111);
        Credits { rsp: field, req: field, data: field }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    LlcrdAck,
    RetryIdle,
    RetryReq,
    RetryAck,
    RetryFrame,
    InitParam,
    Ide,
    Unknown,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlit {
    pub ctl_fmt: u8,
    pub llctrl: u8,
    pub sub_type: u8,
    pub payload: u64,
    pub credits: Credits,
}

impl ControlFlit {
    pub fn retry_idle(llr_wrap: u8) -> Self {
        ControlFlit {
            ctl_fmt: CTL_FMT_LINK,
            llctrl: LLCTRL_RETRY,
            sub_type: RETRY_IDLE,
            payload: param_payload(llr_wrap),
            ..Default::default()
        }
    }

    pub fn init_param(llr_wrap: u8) -> Self {
        ControlFlit {
            ctl_fmt: CTL_FMT_LINK,
            llctrl: LLCTRL_INIT,
            sub_type: INIT_PARAM,
            payload: param_payload(llr_wrap),
            ..Default::default()
        }
    }

    pub fn llcrd_ack(credits: Credits) -> Self {
        ControlFlit {
            ctl_fmt: CTL_FMT_LINK,
            llctrl: LLCTRL_LLCRD,
            sub_type: LLCRD_ACK,
            credits,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> ControlKind {
        match (self.ctl_fmt, self.llctrl, self.sub_type) {
            (CTL_FMT_LINK, LLCTRL_LLCRD, LLCRD_ACK) => ControlKind::LlcrdAck,
            (CTL_FMT_LINK, LLCTRL_RETRY, RETRY_IDLE) => ControlKind::RetryIdle,
            (CTL_FMT_LINK, LLCTRL_RETRY, RETRY_REQ) => ControlKind::RetryReq,
            (CTL_FMT_LINK, LLCTRL_RETRY, RETRY_ACK) => ControlKind::RetryAck,
            (CTL_FMT_LINK, LLCTRL_RETRY, RETRY_FRAME) => ControlKind::RetryFrame,
            (CTL_FMT_LINK, LLCTRL_INIT, INIT_PARAM) => ControlKind::InitParam,
            (CTL_FMT_IDE, LLCTRL_IDE, _) => ControlKind::Ide,
            _ => ControlKind::Unknown,
        }
    }

    /// Any INIT-family flit, whatever its sub-type.
    pub fn is_init(&self) -> bool {
        self.ctl_fmt == CTL_FMT_LINK && self.llctrl == LLCTRL_INIT
    }

    pub fn param(&self) -> ParamPayload {
        ParamPayload::unpack(self.payload as u128)
    }

    pub fn to_payload(&self) -> Bits512 {
        let header = FlitHeader {
            flit_type: true,
            slot0: self.ctl_fmt,
            rsp_crd: self.credits.rsp,
            req_crd: self.credits.req,
            data_crd: self.credits.data,
            ..Default::default()
        };
        let slot = ControlSlot {
            payload: self.payload,
            sub_type: self.sub_type,
            llctrl: self.llctrl,
            ..Default::default()
        };
        let mut bits = Bits512::ZERO;
        bits.set_bits(0, FlitHeader::WIDTH as usize, header.pack());
        bits.set_bits(FlitHeader::WIDTH as usize, ControlSlot::WIDTH as usize, slot.pack());
        bits
    }

    /// Reads the control fields of a payload whose header has `flit_type` set.
    pub fn from_payload(bits: &Bits512) -> Self {
        let header = FlitHeader::unpack(bits.bits(0, FlitHeader::WIDTH as usize));
        let slot = ControlSlot::unpack(bits.bits(FlitHeader::WIDTH as usize, ControlSlot::WIDTH as usize));
        ControlFlit {
            ctl_fmt: header.slot0,
            llctrl: slot.llctrl,
            sub_type: slot.sub_type,
            payload: slot.payload,
            credits: Credits { rsp: header.rsp_crd, req: header.req_crd, data: header.data_crd },
        }
    }
}

fn param_payload(llr_wrap: u8) -> u64 {
    ParamPayload { llr_wrap, version: PROTOCOL_VERSION, ..Default::default() }.pack() as u64
}

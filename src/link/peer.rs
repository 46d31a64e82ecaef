use asynchronix::model::{Model, Output};
use log::{debug, trace};

use crate::flit::*;

/// How the simulated device answers the host's handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerMode {
    /// Echoes RETRY.Idle and INIT.Param.
    Echo,
    /// Never answers.
    Silent,
    /// Answers RETRY.Idle with a RETRY.Req.
    Garbled,
}

/// Minimal device end of the link, for demos and tests.
///
/// Until its INIT.Param echo it reads every host flit as a control flit;
/// afterwards it only counts them. Device traffic is injected through
/// [`DevicePeer::on_inject`].
pub struct DevicePeer {
    mode: PeerMode,
    llr_wrap: u8,
    initialized: bool,
    pub o_flit: Output<Flit>,
}

impl DevicePeer {
    pub fn new(mode: PeerMode, llr_wrap: u8) -> Self {
        DevicePeer { mode, llr_wrap, initialized: false, o_flit: Output::new() }
    }

    /// Reply to one host flit, if any.
    pub fn answer(&mut self, flit: &Flit) -> Option<ControlFlit> {
        if self.initialized || self.mode == PeerMode::Silent {
            return None;
        }
        let header = FlitHeader::unpack(flit.payload.bits(0, HEADER_BITS));
        if !header.is_control() {
            return None;
        }
        let ctrl = ControlFlit::from_payload(&flit.payload);
        match (self.mode, ctrl.kind()) {
            (PeerMode::Echo, ControlKind::RetryIdle) => Some(ControlFlit::retry_idle(self.llr_wrap)),
            (PeerMode::Echo, ControlKind::InitParam) => {
                self.initialized = true;
                Some(ControlFlit::init_param(self.llr_wrap))
            }
            (PeerMode::Garbled, ControlKind::RetryIdle) => Some(ControlFlit {
                llctrl: LLCTRL_RETRY,
                sub_type: RETRY_REQ,
                ..Default::default()
            }),
            _ => None,
        }
    }

    // inputs

    pub async fn on_flit(&mut self, flit: Flit) {
        trace!("device rx crc {:#06x}", flit.crc);
        if let Some(reply) = self.answer(&flit) {
            debug!("device replies {:?}", reply.kind());
            self.o_flit.send(Flit::seal(reply.to_payload())).await;
        }
    }

    pub async fn on_inject(&mut self, flit: Flit) {
        self.o_flit.send(flit).await;
    }
}

impl Model for DevicePeer {}

fn upstream_flit(h: HFormat, slot0: u128, slots: [(GFormat, u128); 3]) -> Flit {
    Flit::seal(ProtocolFlit::new(h, slot0, slots).to_payload())
}

/// Device flit carrying a single request.
pub fn request_flit(req: D2hReq) -> Flit {
    let slot0 = upstream::H1 { req, ..Default::default() };
    upstream_flit(HFormat::H1, slot0.pack(), [(GFormat::G1, 0); 3])
}

/// Device flits carrying one data line: the header with three words, then the
/// last word.
pub fn data_flits(data_header: D2hDataHeader, words: LineWords) -> [Flit; 2] {
    let slot0 = upstream::H1 { data_header, ..Default::default() };
    let first = upstream_flit(
        HFormat::H1,
        slot0.pack(),
        [(GFormat::G0, words[0]), (GFormat::G0, words[1]), (GFormat::G0, words[2])],
    );
    let second = upstream_flit(HFormat::H1, 0, [(GFormat::G0, words[3]), (GFormat::G1, 0), (GFormat::G1, 0)]);
    [first, second]
}

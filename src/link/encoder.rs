use std::collections::VecDeque;

use asynchronix::model::{Model, Output};
use log::{debug, trace};

use crate::flit::*;
use super::common::LINE_WORDS;

/// Outbound slot multiplexer.
///
/// Each call to [`SlotMux::next_flit`] builds at most one flit from the
/// pending responses, data lines and control flits. Data words that do not
/// fit in the current flit wait in `rollover` and go out first, before the
/// words of any later line. Outside of H3 flits, which carry several lines at
/// once, the buffer never holds more than 3 words.
pub struct SlotMux {
    rsp_q: VecDeque<H2dRsp>,
    data_q: VecDeque<(H2dDataHeader, LineWords)>,
    ctrl_q: VecDeque<ControlFlit>,
    rollover: VecDeque<u128>,
    link_up: bool,
    pub o_flit: Output<Flit>,
}

impl Default for SlotMux {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotMux {
    pub fn new() -> Self {
        SlotMux {
            rsp_q: VecDeque::new(),
            data_q: VecDeque::new(),
            ctrl_q: VecDeque::new(),
            rollover: VecDeque::new(),
            link_up: false,
            o_flit: Output::new(),
        }
    }

    pub fn push_rsp(&mut self, rsp: H2dRsp) {
        self.rsp_q.push_back(rsp);
    }

    pub fn push_data(&mut self, header: H2dDataHeader, words: LineWords) {
        self.data_q.push_back((header, words));
    }

    pub fn push_ctrl(&mut self, flit: ControlFlit) {
        self.ctrl_q.push_back(flit);
    }

    /// Data words already split off a line and not yet sent.
    pub fn buffered(&self) -> usize {
        self.rollover.len()
    }

    pub fn pending_rsp(&self) -> usize {
        self.rsp_q.len()
    }

    pub fn pending_data(&self) -> usize {
        self.data_q.len()
    }

    pub fn is_idle(&self) -> bool {
        self.rsp_q.is_empty() && self.data_q.is_empty() && self.ctrl_q.is_empty() && self.rollover.is_empty()
    }

    /// Builds the next flit, or returns `None` when nothing is pending.
    pub fn next_flit(&mut self) -> Option<Flit> {
        let payload = if self.rollover.len() >= LINE_WORDS {
            self.all_data()
        } else if let Some(ctrl) = self.ctrl_q.pop_front() {
            ctrl.to_payload()
        } else if !self.rsp_q.is_empty() || (!self.data_q.is_empty() && self.room_for_line()) {
            self.protocol().to_payload()
        } else if !self.rollover.is_empty() {
            self.drain().to_payload()
        } else {
            return None;
        };
        Some(Flit::seal(payload))
    }

    /// Like [`SlotMux::next_flit`] but only ever sends control flits, as
    /// required before the link is up.
    pub fn next_control_flit(&mut self) -> Option<Flit> {
        self.ctrl_q.pop_front().map(|ctrl| Flit::seal(ctrl.to_payload()))
    }

    fn all_data(&mut self) -> Bits512 {
        let mut words = [0u128; 4];
        for word in words.iter_mut() {
            *word = self.rollover.pop_front().unwrap_or_default();
        }
        trace!("all-data flit, {} words left", self.rollover.len());
        Bits512::from_words_be(words)
    }

    /// A line accepted now leaves at most 3 words buffered once its flit
    /// has filled slots 1 to 3.
    fn room_for_line(&self) -> bool {
        self.rollover.len() < LINE_WORDS - 1
    }

    fn take_line(&mut self) -> Option<H2dDataHeader> {
        let (header, words) = self.data_q.pop_front()?;
        self.rollover.extend(words);
        Some(header)
    }

    fn data_slot(&mut self) -> Option<(GFormat, u128)> {
        self.rollover.pop_front().map(|word| (GFormat::G0, word))
    }

    fn rsp_slot(&mut self) -> (GFormat, u128) {
        let mut g1 = downstream::G1::default();
        for rsp in [&mut g1.rsp0, &mut g1.rsp1, &mut g1.rsp2, &mut g1.rsp3] {
            if let Some(next) = self.rsp_q.pop_front() {
                *rsp = next;
            }
        }
        (GFormat::G1, g1.pack())
    }

    fn protocol(&mut self) -> ProtocolFlit {
        if let Some(rsp0) = self.rsp_q.pop_front() {
            let rsp1 = self.rsp_q.pop_front().unwrap_or_default();
            let data_header = if self.room_for_line() {
                self.take_line().unwrap_or_default()
            } else {
                H2dDataHeader::default()
            };
            let slot0 = downstream::H1 { data_header, rsp0, rsp1, ..Default::default() };
            let slots = [(); 3].map(|_| match self.data_slot() {
                Some(slot) => slot,
                None => self.rsp_slot(),
            });
            ProtocolFlit::new(HFormat::H1, slot0.pack(), slots)
        } else if self.data_q.len() >= 2 {
            let mut h3 = downstream::H3::default();
            for dh in [&mut h3.dh0, &mut h3.dh1, &mut h3.dh2, &mut h3.dh3] {
                if let Some(header) = self.take_line() {
                    *dh = header;
                }
            }
            let first = self.data_slot().unwrap_or((GFormat::G0, 0));
            let slots = [first, (GFormat::G1, 0), (GFormat::G1, 0)];
            ProtocolFlit::new(HFormat::H3, h3.pack(), slots)
        } else {
            let data_header = self.take_line().unwrap_or_default();
            let slot0 = downstream::H1 { data_header, ..Default::default() };
            let slots = [(); 3].map(|_| self.data_slot().unwrap_or((GFormat::G0, 0)));
            ProtocolFlit::new(HFormat::H1, slot0.pack(), slots)
        }
    }

    /// Sends 1 to 3 buffered words with an empty header slot; unused slots
    /// carry an empty G2.
    fn drain(&mut self) -> ProtocolFlit {
        let slots = [(); 3].map(|_| self.data_slot().unwrap_or((GFormat::G2, 0)));
        ProtocolFlit::new(HFormat::H1, 0, slots)
    }

    // inputs

    pub fn on_rsp(&mut self, rsp: H2dRsp) {
        self.push_rsp(rsp);
    }

    pub fn on_data(&mut self, (header, words): (H2dDataHeader, LineWords)) {
        self.push_data(header, words);
    }

    pub fn on_ctrl(&mut self, flit: ControlFlit) {
        self.push_ctrl(flit);
    }

    pub fn on_link_up(&mut self) {
        self.link_up = true;
    }

    pub async fn on_tick(&mut self) {
        let flit = if self.link_up { self.next_flit() } else { self.next_control_flit() };
        if let Some(flit) = flit {
            debug!("tx flit crc {:#06x}, {} words buffered", flit.crc, self.rollover.len());
            self.o_flit.send(flit).await;
        }
    }
}

impl Model for SlotMux {}

use asynchronix::model::{Model, Output};
use log::{debug, error, trace};

use crate::flit::*;
use super::common::LINE_WORDS;

/// Inbound slot demultiplexer.
///
/// Splits each device-to-host flit into requests, responses, data headers and
/// data words. `rollover` counts the data words still owed to data headers
/// already seen; while it is at least a full line, flits are read as pure data.
pub struct SlotDemux {
    rollover: u32,
    pub o_req: Output<D2hReq>,
    pub o_rsp: Output<UpstreamRsp>,
    pub o_data_header: Output<UpstreamDataHeader>,
    pub o_data: Output<u128>,
    pub o_ctrl: Output<ControlFlit>,
    pub o_error: Output<DecodeError>,
}

impl Default for SlotDemux {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotDemux {
    pub fn new() -> Self {
        SlotDemux {
            rollover: 0,
            o_req: Output::new(),
            o_rsp: Output::new(),
            o_data_header: Output::new(),
            o_data: Output::new(),
            o_ctrl: Output::new(),
            o_error: Output::new(),
        }
    }

    pub fn rollover(&self) -> u32 {
        self.rollover
    }

    /// Demultiplexes one payload. On error the rollover count is left as it
    /// was before the call.
    pub fn decode(&mut self, payload: &Bits512) -> Result<Vec<Upstream>, DecodeError> {
        if self.rollover >= LINE_WORDS as u32 {
            trace!("all-data flit, rollover {}", self.rollover);
            self.rollover -= LINE_WORDS as u32;
            return Ok(payload.to_words_be().into_iter().map(Upstream::Data).collect());
        }

        let flit = ProtocolFlit::from_payload(payload);
        if flit.header.is_control() {
            return Ok(vec![Upstream::Control(ControlFlit::from_payload(payload))]);
        }
        trace!("protocol flit {:?}", flit.header.formats());

        let mut rollover = self.rollover;
        let mut out = decode_h(flit.header.h_format(), flit.slot0)?;
        account(&mut rollover, &out, 0)?;
        for (i, bits) in flit.slots.iter().enumerate() {
            let slot = i + 1;
            let items = decode_g(slot, flit.header.g_format(slot), *bits)?;
            account(&mut rollover, &items, slot)?;
            out.extend(items);
        }
        self.rollover = rollover;
        Ok(out)
    }

    async fn route(&mut self, item: Upstream) {
        debug!("rx {:?}", item);
        match item {
            Upstream::Request(req) => self.o_req.send(req).await,
            Upstream::Response(rsp) => self.o_rsp.send(rsp).await,
            Upstream::DataHeader(dh) => self.o_data_header.send(dh).await,
            Upstream::Data(word) => self.o_data.send(word).await,
            Upstream::Control(ctrl) => self.o_ctrl.send(ctrl).await,
        }
    }

    // inputs

    pub async fn on_flit(&mut self, flit: Flit) {
        let decoded = flit.check().map_err(DecodeError::from).and_then(|_| self.decode(&flit.payload));
        match decoded {
            Ok(items) => {
                for item in items {
                    self.route(item).await;
                }
            }
            Err(e) => {
                error!("dropping inbound flit: {}", e);
                self.o_error.send(e).await;
            }
        }
    }
}

impl Model for SlotDemux {}

fn account(rollover: &mut u32, items: &[Upstream], slot: usize) -> Result<(), DecodeError> {
    for item in items {
        match item {
            Upstream::DataHeader(_) => *rollover += LINE_WORDS as u32,
            Upstream::Data(_) => {
                *rollover = rollover.checked_sub(1).ok_or(DecodeError::RolloverUnderflow { slot })?;
            }
            _ => (),
        }
    }
    Ok(())
}

fn decode_h(format: HFormat, bits: u128) -> Result<Vec<Upstream>, DecodeError> {
    Ok(match format {
        HFormat::H0 => upstream::H0::unpack(bits).messages(),
        HFormat::H1 => upstream::H1::unpack(bits).messages(),
        HFormat::H2 => upstream::H2::unpack(bits).messages(),
        HFormat::H3 => upstream::H3::unpack(bits).messages(),
        HFormat::H5 => upstream::H5::unpack(bits).messages(),
        HFormat::H4 | HFormat::H6 | HFormat::H7 => {
            return Err(DecodeError::ReservedSlotType(SlotTag::Header(format)))
        }
    })
}

fn decode_g(slot: usize, format: GFormat, bits: u128) -> Result<Vec<Upstream>, DecodeError> {
    Ok(match format {
        GFormat::G0 => vec![Upstream::Data(bits)],
        GFormat::G1 => upstream::G1::unpack(bits).messages(),
        GFormat::G2 => upstream::G2::unpack(bits).messages(),
        GFormat::G3 => upstream::G3::unpack(bits).messages(),
        GFormat::G4 => upstream::G4::unpack(bits).messages(),
        GFormat::G5 => upstream::G5::unpack(bits).messages(),
        GFormat::G6 => upstream::G6::unpack(bits).messages(),
        GFormat::G7 => return Err(DecodeError::ReservedSlotType(SlotTag::Generic { slot, format })),
    })
}

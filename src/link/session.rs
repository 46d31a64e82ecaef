use std::sync::{Arc, Mutex};
use std::time::Duration;

use asynchronix::simulation::{Address, Mailbox, SimInit, Simulation};
use asynchronix::time::MonotonicTime;

use crate::flit::Flit;
use super::common::LinkSpec;
use super::decoder::SlotDemux;
use super::encoder::SlotMux;
use super::host::SharedMemory;
use super::init::{LinkInit, LinkInitError};
use super::monitor::{Monitor, SessionLog};
use super::peer::{DevicePeer, PeerMode};
use super::responder::{LineAssembler, RequestResponder};

/// Host end of a link wired to a simulated device.
///
/// Device flits reach the decoder through the peer; the encoder is ticked
/// once per flit period and its flits go to both the peer and the monitor.
pub struct LinkSession {
    sim: Simulation,
    spec: LinkSpec,
    log: Arc<Mutex<SessionLog>>,
    mux: Address<SlotMux>,
    init: Address<LinkInit>,
    peer: Address<DevicePeer>,
}

impl LinkSession {
    pub fn new(spec: LinkSpec, mode: PeerMode, memory: SharedMemory) -> Self {
        let log = Arc::new(Mutex::new(SessionLog::default()));

        // create models
        let mut demux = SlotDemux::new();
        let mut mux = SlotMux::new();
        let mut init = LinkInit::new(spec);
        let mut responder = RequestResponder::new(memory.clone());
        let mut assembler = LineAssembler::new(memory);
        let mut peer = DevicePeer::new(mode, spec.retry_buffer_size);
        let monitor = Monitor::new(log.clone());

        // create mailboxes
        let demux_mbox = Mailbox::<SlotDemux>::new();
        let mux_mbox = Mailbox::<SlotMux>::new();
        let init_mbox = Mailbox::<LinkInit>::new();
        let responder_mbox = Mailbox::<RequestResponder>::new();
        let assembler_mbox = Mailbox::<LineAssembler>::new();
        let peer_mbox = Mailbox::<DevicePeer>::new();
        let monitor_mbox = Mailbox::<Monitor>::new();

        // connect models
        demux.o_req.connect(RequestResponder::on_request, &responder_mbox);
        demux.o_rsp.connect(Monitor::on_rsp, &monitor_mbox);
        demux.o_data_header.connect(LineAssembler::on_header, &assembler_mbox);
        demux.o_data.connect(LineAssembler::on_data, &assembler_mbox);
        demux.o_ctrl.connect(LinkInit::on_ctrl, &init_mbox);
        demux.o_error.connect(Monitor::on_error, &monitor_mbox);
        responder.o_rsp.connect(SlotMux::on_rsp, &mux_mbox);
        responder.o_data.connect(SlotMux::on_data, &mux_mbox);
        responder.o_pull.connect(LineAssembler::on_pull, &assembler_mbox);
        assembler.o_line.connect(Monitor::on_line, &monitor_mbox);
        init.o_ctrl.connect(SlotMux::on_ctrl, &mux_mbox);
        init.o_link_up.connect(SlotMux::on_link_up, &mux_mbox);
        init.o_outcome.connect(Monitor::on_init, &monitor_mbox);
        mux.o_flit.connect(DevicePeer::on_flit, &peer_mbox);
        mux.o_flit.connect(Monitor::on_tx, &monitor_mbox);
        peer.o_flit.connect(SlotDemux::on_flit, &demux_mbox);

        // addresses
        let mux_addr = mux_mbox.address();
        let init_addr = init_mbox.address();
        let peer_addr = peer_mbox.address();

        let sim = SimInit::new()
            .add_model(demux, demux_mbox)
            .add_model(mux, mux_mbox)
            .add_model(init, init_mbox)
            .add_model(responder, responder_mbox)
            .add_model(assembler, assembler_mbox)
            .add_model(peer, peer_mbox)
            .add_model(monitor, monitor_mbox)
            .init(MonotonicTime::EPOCH);

        LinkSession { sim, spec, log, mux: mux_addr, init: init_addr, peer: peer_addr }
    }

    /// Kicks off link initialization; it begins after the startup delay.
    pub fn start(&mut self) {
        self.sim.send_event(LinkInit::on_start, (), &self.init);
    }

    /// Lets the encoder emit one flit, then advances one flit period.
    pub fn tick(&mut self) {
        self.sim.send_event(SlotMux::on_tick, (), &self.mux);
        self.sim.step_by(self.spec.flit_period);
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks until link init reports an outcome or `max_ticks` have passed.
    pub fn run_init(&mut self, max_ticks: usize) -> Option<Result<(), LinkInitError>> {
        for _ in 0..max_ticks {
            if let Some(outcome) = self.init_outcome() {
                return Some(outcome);
            }
            self.tick();
        }
        self.init_outcome()
    }

    /// Advances simulated time without ticking the encoder.
    pub fn advance(&mut self, duration: Duration) {
        self.sim.step_by(duration);
    }

    /// Sends a device-to-host flit through the peer.
    pub fn inject(&mut self, flit: Flit) {
        self.sim.send_event(DevicePeer::on_inject, flit, &self.peer);
    }

    pub fn time(&self) -> MonotonicTime {
        self.sim.time()
    }

    pub fn init_outcome(&self) -> Option<Result<(), LinkInitError>> {
        self.log().init
    }

    pub fn log(&self) -> SessionLog {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

use std::sync::{Arc, Mutex};

use asynchronix::model::Model;

use crate::flit::{DecodeError, Flit, UpstreamRsp};
use super::init::LinkInitError;
use super::responder::AssembledLine;

/// Everything a session observed.
#[derive(Debug, Default, Clone)]
pub struct SessionLog {
    /// Flits sent by the host, in order.
    pub tx: Vec<Flit>,
    /// Responses received from the device.
    pub responses: Vec<UpstreamRsp>,
    pub lines: Vec<AssembledLine>,
    pub init: Option<Result<(), LinkInitError>>,
    pub errors: Vec<DecodeError>,
}

/// Records session events into a shared [`SessionLog`].
pub struct Monitor {
    log: Arc<Mutex<SessionLog>>,
}

impl Monitor {
    pub fn new(log: Arc<Mutex<SessionLog>>) -> Self {
        Monitor { log }
    }

    fn record(&self, f: impl FnOnce(&mut SessionLog)) {
        match self.log.lock() {
            Ok(mut log) => f(&mut log),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    // inputs

    pub fn on_tx(&mut self, flit: Flit) {
        self.record(|log| log.tx.push(flit));
    }

    pub fn on_rsp(&mut self, rsp: UpstreamRsp) {
        self.record(|log| log.responses.push(rsp));
    }

    pub fn on_line(&mut self, line: AssembledLine) {
        self.record(|log| log.lines.push(line));
    }

    pub fn on_init(&mut self, outcome: Result<(), LinkInitError>) {
        self.record(|log| log.init = Some(outcome));
    }

    pub fn on_error(&mut self, error: DecodeError) {
        self.record(|log| log.errors.push(error));
    }
}

impl Model for Monitor {}

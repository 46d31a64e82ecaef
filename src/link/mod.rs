mod common;
mod decoder;
mod encoder;
mod init;
mod responder;
mod host;
mod peer;
mod monitor;
mod session;

pub use common::*;
pub use decoder::SlotDemux;
pub use encoder::SlotMux;
pub use init::{InitEvent, InitState, InitStep, LinkInit, LinkInitError};
pub use responder::{AssembledLine, DataPull, LineAssembler, Reply, RequestResponder};
pub use host::{HostMemory, SharedMemory, SparseMemory};
pub use peer::{data_flits, request_flit, DevicePeer, PeerMode};
pub use monitor::{Monitor, SessionLog};
pub use session::LinkSession;

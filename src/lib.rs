//! Flit-layer engine of a CXL cache/memory link, for driving and checking a
//! device in simulation.
//!
//! - [`flit`]: header records, slot layouts, control flits and the flit CRC.
//! - [`link`]: simulated link components (slot decoder and encoder, link
//!   initialization, request responder) built on `asynchronix` models.

pub mod flit;
pub mod link;

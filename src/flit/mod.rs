pub mod schema;
mod bits;
mod messages;
pub mod slots;
mod payload;
mod control;
mod crc;
mod error;

pub use bits::Bits512;
pub use messages::*;
pub use payload::*;
pub use control::*;
pub use crc::*;
pub use error::*;
pub use slots::{downstream, upstream, GFormat, HFormat, G_SLOT_BITS, H_SLOT_BITS};
pub use schema::{Field, FieldValue, Layout, Record};

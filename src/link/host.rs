use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::common::LINE_BYTES;

/// Host memory as seen by the link: whole-line writes, byte reads.
pub trait HostMemory: Send {
    fn write(&mut self, line_address: u64, data: &[u8; 64]);
    fn read(&mut self, line_address: u64, len: usize) -> Vec<u8>;
}

/// Host memory handle shared between the models that touch it.
pub type SharedMemory = Arc<Mutex<dyn HostMemory>>;

/// Sparse line-granular memory; unwritten bytes read as zero.
#[derive(Default)]
pub struct SparseMemory {
    lines: HashMap<u64, [u8; 64]>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedMemory {
        Arc::new(Mutex::new(self))
    }

    pub fn lines_written(&self) -> usize {
        self.lines.len()
    }
}

fn line_base(address: u64) -> u64 {
    address & !(LINE_BYTES as u64 - 1)
}

impl HostMemory for SparseMemory {
    fn write(&mut self, line_address: u64, data: &[u8; 64]) {
        self.lines.insert(line_base(line_address), *data);
    }

    fn read(&mut self, line_address: u64, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut address = line_address;
        while out.len() < len {
            let base = line_base(address);
            let offset = (address - base) as usize;
            let take = (LINE_BYTES - offset).min(len - out.len());
            match self.lines.get(&base) {
                Some(line) => out.extend_from_slice(&line[offset..offset + take]),
                None => out.resize(out.len() + take, 0),
            }
            address = base + LINE_BYTES as u64;
        }
        out
    }
}

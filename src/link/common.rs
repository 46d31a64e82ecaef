use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct LinkSpec {                   // unit         reasonable defaults
    pub retry_buffer_size: u8,          // flits        64
    pub startup_delay: Duration,        // sim time     100 ns
    pub init_timeout: Duration,         // sim time     1 us
    pub flit_period: Duration,          // sim time     1 ns
    pub credit_rounds: u32,             // rounds       7
    pub credits_per_return: u8,         // credits      7 (3-bit count)
}

impl Default for LinkSpec {
    fn default() -> Self {
        LinkSpec {
            retry_buffer_size: 64,
            startup_delay: Duration::from_nanos(100),
            init_timeout: Duration::from_micros(1),
            flit_period: Duration::from_nanos(1),
            credit_rounds: 7,
            credits_per_return: 7,
        }
    }
}

/// Words per cache line.
pub const LINE_WORDS: usize = 4;
/// Bytes per cache line.
pub const LINE_BYTES: usize = 64;

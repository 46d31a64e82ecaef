//! Slot layouts of a protocol flit.
//!
//! Slot 0 is 96 bits wide and always holds an H-format; slots 1 to 3 are
//! 128 bits wide and hold a G-format. G0 is a raw 128-bit data chunk and has
//! no layout. The same tag value means different layouts upstream
//! (device to host) and downstream (host to device).

/// Width of slot 0.
pub const H_SLOT_BITS: usize = 96;
/// Width of slots 1 to 3.
pub const G_SLOT_BITS: usize = 128;

/// Format tag of slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HFormat {
    H0,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    H7,
}

/// Format tag of slots 1 to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GFormat {
    G0,
    G1,
    G2,
    G3,
    G4,
    G5,
    G6,
    G7,
}

impl HFormat {
    pub fn from_bits(bits: u8) -> HFormat {
        use HFormat::*;
        [H0, H1, H2, H3, H4, H5, H6, H7][(bits & 0b111) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl GFormat {
    pub fn from_bits(bits: u8) -> GFormat {
        use GFormat::*;
        [G0, G1, G2, G3, G4, G5, G6, G7][(bits & 0b111) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Host-to-device slot layouts (H2D and M2S traffic).
pub mod downstream {
    use super::super::messages::*;
    use super::super::schema::{record, Record};

    record! {
        pub struct H0 : "H0 down" {
            rsp: H2dRsp = H2dRsp::WIDTH,
            req: H2dReq = H2dReq::WIDTH,
        }
    }

    record! {
        /// Data header plus two responses.
        pub struct H1 : "H1 down" {
            rsvd: u8 = 8,
            rsp1: H2dRsp = H2dRsp::WIDTH,
            rsp0: H2dRsp = H2dRsp::WIDTH,
            data_header: H2dDataHeader = H2dDataHeader::WIDTH,
        }
    }

    record! {
        pub struct H2 : "H2 down" {
            rsvd: u8 = 8,
            data_header: H2dDataHeader = H2dDataHeader::WIDTH,
            req: H2dReq = H2dReq::WIDTH,
        }
    }

    record! {
        /// Four data headers.
        pub struct H3 : "H3 down" {
            dh3: H2dDataHeader = H2dDataHeader::WIDTH,
            dh2: H2dDataHeader = H2dDataHeader::WIDTH,
            dh1: H2dDataHeader = H2dDataHeader::WIDTH,
            dh0: H2dDataHeader = H2dDataHeader::WIDTH,
        }
    }

    record! {
        pub struct H4 : "H4 down" {
            rsvd: u16 = 9,
            rwd: M2sRwd = M2sRwd::WIDTH,
        }
    }

    record! {
        pub struct H5 : "H5 down" {
            rsvd: u16 = 9,
            req: M2sReq = M2sReq::WIDTH,
        }
    }

    record! {
        pub struct H6 : "H6 down" {
            mac: u128 = 96,
        }
    }

    record! {
        /// Four responses.
        pub struct G1 : "G1 down" {
            rsp3: H2dRsp = H2dRsp::WIDTH,
            rsp2: H2dRsp = H2dRsp::WIDTH,
            rsp1: H2dRsp = H2dRsp::WIDTH,
            rsp0: H2dRsp = H2dRsp::WIDTH,
        }
    }

    record! {
        pub struct G2 : "G2 down" {
            rsvd: u8 = 8,
            rsp: H2dRsp = H2dRsp::WIDTH,
            data_header: H2dDataHeader = H2dDataHeader::WIDTH,
            req: H2dReq = H2dReq::WIDTH,
        }
    }

    record! {
        pub struct G3 : "G3 down" {
            rsp: H2dRsp = H2dRsp::WIDTH,
            dh3: H2dDataHeader = H2dDataHeader::WIDTH,
            dh2: H2dDataHeader = H2dDataHeader::WIDTH,
            dh1: H2dDataHeader = H2dDataHeader::WIDTH,
            dh0: H2dDataHeader = H2dDataHeader::WIDTH,
        }
    }

    record! {
        pub struct G4 : "G4 down" {
            rsvd: u32 = 17,
            data_header: H2dDataHeader = H2dDataHeader::WIDTH,
            req: M2sReq = M2sReq::WIDTH,
        }
    }

    record! {
        pub struct G5 : "G5 down" {
            rsvd: u16 = 9,
            rsp: H2dRsp = H2dRsp::WIDTH,
            rwd: M2sRwd = M2sRwd::WIDTH,
        }
    }

    record! {
        pub struct G6 : "G6 down" {
            mac: u128 = 128,
        }
    }

    const _: () = assert!(H0::WIDTH == 96 && H1::WIDTH == 96 && H2::WIDTH == 96 && H3::WIDTH == 96);
    const _: () = assert!(H4::WIDTH == 96 && H5::WIDTH == 96 && H6::WIDTH == 96);
    const _: () = assert!(G1::WIDTH == 128 && G2::WIDTH == 128 && G3::WIDTH == 128);
    const _: () = assert!(G4::WIDTH == 128 && G5::WIDTH == 128 && G6::WIDTH == 128);
}

/// Device-to-host slot layouts (D2H and S2M traffic).
///
/// `messages()` lists the valid sub-messages of a slot from the least
/// significant one up; that is the order the decoder routes them in.
pub mod upstream {
    use super::super::messages::*;
    use super::super::schema::{record, Record};

    fn keep(out: &mut Vec<Upstream>, valid: bool, msg: impl Into<Upstream>) {
        if valid {
            out.push(msg.into());
        }
    }

    record! {
        /// Data header, two responses and an NDR.
        pub struct H0 : "H0 up" {
            rsvd: u16 = 9,
            ndr: S2mNdr = S2mNdr::WIDTH,
            rsp1: D2hRsp = D2hRsp::WIDTH,
            rsp0: D2hRsp = D2hRsp::WIDTH,
            data_header: D2hDataHeader = D2hDataHeader::WIDTH,
        }
    }

    record! {
        /// Request plus data header.
        pub struct H1 : "H1 up" {
            data_header: D2hDataHeader = D2hDataHeader::WIDTH,
            req: D2hReq = D2hReq::WIDTH,
        }
    }

    record! {
        /// Four data headers plus a response.
        pub struct H2 : "H2 up" {
            rsvd: u8 = 8,
            rsp: D2hRsp = D2hRsp::WIDTH,
            dh3: D2hDataHeader = D2hDataHeader::WIDTH,
            dh2: D2hDataHeader = D2hDataHeader::WIDTH,
            dh1: D2hDataHeader = D2hDataHeader::WIDTH,
            dh0: D2hDataHeader = D2hDataHeader::WIDTH,
        }
    }

    record! {
        pub struct H3 : "H3 up" {
            rsvd: u32 = 26,
            ndr: S2mNdr = S2mNdr::WIDTH,
            drs: S2mDrs = S2mDrs::WIDTH,
        }
    }

    record! {
        pub struct H4 : "H4 up" {
            rsvd: u64 = 36,
            ndr1: S2mNdr = S2mNdr::WIDTH,
            ndr0: S2mNdr = S2mNdr::WIDTH,
        }
    }

    record! {
        pub struct H5 : "H5 up" {
            rsvd: u16 = 16,
            drs1: S2mDrs = S2mDrs::WIDTH,
            drs0: S2mDrs = S2mDrs::WIDTH,
        }
    }

    record! {
        pub struct H6 : "H6 up" {
            mac: u128 = 96,
        }
    }

    record! {
        /// Four responses.
        pub struct G1 : "G1 up" {
            rsvd: u64 = 48,
            rsp3: D2hRsp = D2hRsp::WIDTH,
            rsp2: D2hRsp = D2hRsp::WIDTH,
            rsp1: D2hRsp = D2hRsp::WIDTH,
            rsp0: D2hRsp = D2hRsp::WIDTH,
        }
    }

    record! {
        pub struct G2 : "G2 up" {
            rsvd: u16 = 12,
            rsp: D2hRsp = D2hRsp::WIDTH,
            data_header: D2hDataHeader = D2hDataHeader::WIDTH,
            req: D2hReq = D2hReq::WIDTH,
        }
    }

    record! {
        pub struct G3 : "G3 up" {
            rsvd: u64 = 40,
            rsp: D2hRsp = D2hRsp::WIDTH,
            dh3: D2hDataHeader = D2hDataHeader::WIDTH,
            dh2: D2hDataHeader = D2hDataHeader::WIDTH,
            dh1: D2hDataHeader = D2hDataHeader::WIDTH,
            dh0: D2hDataHeader = D2hDataHeader::WIDTH,
        }
    }

    record! {
        pub struct G4 : "G4 up" {
            rsvd: u32 = 28,
            ndr1: S2mNdr = S2mNdr::WIDTH,
            ndr0: S2mNdr = S2mNdr::WIDTH,
            drs: S2mDrs = S2mDrs::WIDTH,
        }
    }

    record! {
        pub struct G5 : "G5 up" {
            rsvd: u128 = 68,
            ndr1: S2mNdr = S2mNdr::WIDTH,
            ndr0: S2mNdr = S2mNdr::WIDTH,
        }
    }

    record! {
        pub struct G6 : "G6 up" {
            rsvd: u8 = 8,
            drs2: S2mDrs = S2mDrs::WIDTH,
            drs1: S2mDrs = S2mDrs::WIDTH,
            drs0: S2mDrs = S2mDrs::WIDTH,
        }
    }

    const _: () = assert!(H0::WIDTH == 96 && H1::WIDTH == 96 && H2::WIDTH == 96 && H3::WIDTH == 96);
    const _: () = assert!(H4::WIDTH == 96 && H5::WIDTH == 96 && H6::WIDTH == 96);
    const _: () = assert!(G1::WIDTH == 128 && G2::WIDTH == 128 && G3::WIDTH == 128);
    const _: () = assert!(G4::WIDTH == 128 && G5::WIDTH == 128 && G6::WIDTH == 128);

    impl H0 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.data_header.valid, self.data_header);
            keep(&mut out, self.rsp0.valid, self.rsp0);
            keep(&mut out, self.rsp1.valid, self.rsp1);
            keep(&mut out, self.ndr.valid, self.ndr);
            out
        }
    }

    impl H1 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.req.valid, self.req);
            keep(&mut out, self.data_header.valid, self.data_header);
            out
        }
    }

    impl H2 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            for dh in [self.dh0, self.dh1, self.dh2, self.dh3] {
                keep(&mut out, dh.valid, dh);
            }
            keep(&mut out, self.rsp.valid, self.rsp);
            out
        }
    }

    impl H3 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.drs.valid, self.drs);
            keep(&mut out, self.ndr.valid, self.ndr);
            out
        }
    }

    impl H5 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.drs0.valid, self.drs0);
            keep(&mut out, self.drs1.valid, self.drs1);
            out
        }
    }

    impl G1 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            for rsp in [self.rsp0, self.rsp1, self.rsp2, self.rsp3] {
                keep(&mut out, rsp.valid, rsp);
            }
            out
        }
    }

    impl G2 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.req.valid, self.req);
            keep(&mut out, self.data_header.valid, self.data_header);
            keep(&mut out, self.rsp.valid, self.rsp);
            out
        }
    }

    impl G3 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            for dh in [self.dh0, self.dh1, self.dh2, self.dh3] {
                keep(&mut out, dh.valid, dh);
            }
            keep(&mut out, self.rsp.valid, self.rsp);
            out
        }
    }

    impl G4 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.drs.valid, self.drs);
            keep(&mut out, self.ndr0.valid, self.ndr0);
            keep(&mut out, self.ndr1.valid, self.ndr1);
            out
        }
    }

    impl G5 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            keep(&mut out, self.ndr0.valid, self.ndr0);
            keep(&mut out, self.ndr1.valid, self.ndr1);
            out
        }
    }

    impl G6 {
        pub fn messages(&self) -> Vec<Upstream> {
            let mut out = Vec::new();
            for drs in [self.drs0, self.drs1, self.drs2] {
                keep(&mut out, drs.valid, drs);
            }
            out
        }
    }
}

//! Declarative bit-field layouts.
//!
//! Every header record and slot layout is described by a [`Layout`]: an ordered
//! list of named fields with bit widths, most significant field first. A single
//! pair of routines ([`Layout::pack`] and [`Layout::unpack`]) turns field values
//! into bits and back, so no record carries its own shift/mask code.
//!
//! Packing masks every value to its declared width. Overflowing bits are
//! dropped silently, the way a hardware register of that width would.

/// One named bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub width: u32,
}

/// Ordered field list of a record, most significant field first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub name: &'static str,
    pub fields: &'static [Field],
}

pub const fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

impl Layout {
    pub const fn width(&self) -> u32 {
        let mut width = 0;
        let mut i = 0;
        while i < self.fields.len() {
            width += self.fields[i].width;
            i += 1;
        }
        width
    }

    /// Bit offset (from the least significant end) and width of a named field.
    pub fn locate(&self, name: &str) -> Option<(u32, u32)> {
        let mut lsb = self.width();
        for field in self.fields {
            lsb -= field.width;
            if field.name == name {
                return Some((lsb, field.width));
            }
        }
        None
    }

    pub fn pack(&self, values: &[u128]) -> u128 {
        debug_assert!(self.width() <= 128, "layout {} wider than 128 bits", self.name);
        debug_assert_eq!(values.len(), self.fields.len());
        self.fields.iter().zip(values).fold(0u128, |acc, (field, value)| {
            acc.checked_shl(field.width).unwrap_or(0) | (value & mask(field.width))
        })
    }

    pub fn unpack(&self, bits: u128) -> Vec<u128> {
        let mut rest = bits;
        let mut values = vec![0u128; self.fields.len()];
        for (value, field) in values.iter_mut().zip(self.fields).rev() {
            *value = rest & mask(field.width);
            rest = rest.checked_shr(field.width).unwrap_or(0);
        }
        values
    }
}

/// A fixed-width record described by a [`Layout`].
pub trait Record: Sized {
    const LAYOUT: Layout;
    const WIDTH: u32 = Self::LAYOUT.width();

    /// Field values in layout order.
    fn to_fields(&self) -> Vec<u128>;
    fn from_fields(values: &[u128]) -> Self;

    fn pack(&self) -> u128 {
        Self::LAYOUT.pack(&self.to_fields())
    }

    fn unpack(bits: u128) -> Self {
        Self::from_fields(&Self::LAYOUT.unpack(bits))
    }
}

/// Conversion between a field's Rust type and its raw bits.
pub trait FieldValue: Sized {
    fn to_raw(&self) -> u128;
    fn from_raw(raw: u128) -> Self;
}

impl FieldValue for bool {
    fn to_raw(&self) -> u128 {
        *self as u128
    }
    fn from_raw(raw: u128) -> Self {
        raw & 1 == 1
    }
}

macro_rules! impl_uint_field {
    ($($t:ty),*) => {
        $(
            impl FieldValue for $t {
                fn to_raw(&self) -> u128 { *self as u128 }
                fn from_raw(raw: u128) -> Self { raw as $t }
            }
        )*
    };
}

impl_uint_field!(u8, u16, u32, u64, u128);

/// Declares a record struct together with its layout.
///
/// Fields are listed most significant first; each gets its Rust type and bit
/// width. Records nest: a field may itself be a record, with width
/// `Inner::WIDTH`.
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $label:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $width:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::flit::schema::Record for $name {
            const LAYOUT: $crate::flit::schema::Layout = $crate::flit::schema::Layout {
                name: $label,
                fields: &[
                    $( $crate::flit::schema::Field { name: stringify!($field), width: $width }, )*
                ],
            };

            fn to_fields(&self) -> Vec<u128> {
                vec![ $( $crate::flit::schema::FieldValue::to_raw(&self.$field), )* ]
            }

            fn from_fields(values: &[u128]) -> Self {
                let mut values = values.iter().copied();
                $name {
                    $( $field: $crate::flit::schema::FieldValue::from_raw(values.next().unwrap_or(0)), )*
                }
            }
        }

        impl $crate::flit::schema::FieldValue for $name {
            fn to_raw(&self) -> u128 {
                $crate::flit::schema::Record::pack(self)
            }
            fn from_raw(raw: u128) -> Self {
                <$name as $crate::flit::schema::Record>::unpack(raw)
            }
        }
    };
}

pub(crate) use record;

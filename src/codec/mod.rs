// Declarative binary codec for fixed-layout radio memory records

pub mod block;
pub mod fields;
pub mod frequency;

pub use block::{hexdump, Block};
pub use fields::{
    BitsField, BytesField, ConstBitsField, ConstField, StringField, UInt16LeField, UInt8Field,
};
pub use frequency::Frequency;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CodecError {
    #[error("Input truncated: need {needed} bytes, have {available}")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Unexpected layout at offset {offset:#06x}: expected {expected:02x?}, found {found:02x?}")]
    UnexpectedLayout {
        offset: usize,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("Unknown {field} value: {value:#04x}")]
    UnknownEnumValue { field: &'static str, value: u8 },

    #[error("Value {value} out of range {min}..={max}")]
    OutOfRange { value: u64, min: u64, max: u64 },

    #[error("String of {len} bytes exceeds field length {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("String contains unsupported byte {byte:#04x}")]
    InvalidString { byte: u8 },

    #[error("Field expects {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Block array holds {len} elements, schema allows {max}")]
    TooManyElements { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Define a closed enumeration for a bit-packed or whole-byte field.
///
/// Decoding a value outside the table fails with `UnknownEnumValue`;
/// fields that must tolerate unknown values use raw integers instead.
#[macro_export]
macro_rules! field_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            pub fn from_raw(raw: u8) -> $crate::codec::Result<Self> {
                match raw {
                    $($value => Ok(Self::$variant),)+
                    _ => Err($crate::codec::CodecError::UnknownEnumValue {
                        field: stringify!($name),
                        value: raw,
                    }),
                }
            }

            pub fn raw(self) -> u8 {
                self as u8
            }
        }
    };
}

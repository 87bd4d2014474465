use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Primitive type names accepted by the `type` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Boolean,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    String,
    Timestamp,
}

impl Type {
    /// Every recognized type, in declaration order.
    pub const ALL: [Type; 11] = [
        Type::Boolean,
        Type::Float32,
        Type::Float64,
        Type::Int8,
        Type::Uint8,
        Type::Int16,
        Type::Uint16,
        Type::Int32,
        Type::Uint32,
        Type::String,
        Type::Timestamp,
    ];

    /// Wire name of the type, as it appears in a schema document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Float32 => "float32",
            Type::Float64 => "float64",
            Type::Int8 => "int8",
            Type::Uint8 => "uint8",
            Type::Int16 => "int16",
            Type::Uint16 => "uint16",
            Type::Int32 => "int32",
            Type::Uint32 => "uint32",
            Type::String => "string",
            Type::Timestamp => "timestamp",
        }
    }

    /// Closed range for the integer types, `None` for everything else.
    pub fn integer_range(&self) -> Option<(f64, f64)> {
        match self {
            Type::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            Type::Uint8 => Some((u8::MIN.into(), u8::MAX.into())),
            Type::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Type::Uint16 => Some((u16::MIN.into(), u16::MAX.into())),
            Type::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Type::Uint32 => Some((u32::MIN.into(), u32::MAX.into())),
            _ => None,
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Type::ALL
            .into_iter()
            .find(|ty| ty.as_str() == value)
            .ok_or_else(|| Error::invalid(format!("unknown type '{value}'")))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for ty in Type::ALL {
            assert_eq!(ty.as_str().parse::<Type>().expect("known type"), ty);
        }
    }

    #[test]
    fn type_names_are_case_sensitive() {
        assert!("Uint8".parse::<Type>().is_err());
        assert!("float".parse::<Type>().is_err());
        assert!("".parse::<Type>().is_err());
    }

    #[test]
    fn integer_ranges_match_machine_widths() {
        assert_eq!(Type::Uint8.integer_range(), Some((0.0, 255.0)));
        assert_eq!(
            Type::Int32.integer_range(),
            Some((-2_147_483_648.0, 2_147_483_647.0))
        );
        assert_eq!(Type::Uint32.integer_range(), Some((0.0, 4_294_967_295.0)));
        assert_eq!(Type::Float64.integer_range(), None);
        assert_eq!(Type::Timestamp.integer_range(), None);
    }
}

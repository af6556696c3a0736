//! Typed IPC values.
//!
//! Every IPC argument and return value is preceded on the wire by a type tag
//! field. Scalars are one text field; vectors carry a length and an element
//! tag followed by their elements.

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::field::{parse_bool, write_field, FieldCursor};

/// Deepest vector-of-vector nesting accepted when decoding.
pub const MAX_VECTOR_DEPTH: usize = 32;

/// Value type tags shared by PTMP and IPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Byte = 1,
    Bool = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    String = 8,
    QString = 9,
    IpAddress = 10,
    Ipv6Address = 11,
    MacAddress = 12,
    Uuid = 13,
    /// IPC only.
    Pair = 14,
    /// IPC only.
    Vector = 15,
    /// IPC only.
    Data = 16,
}

impl TypeTag {
    pub const ALL: [TypeTag; 16] = [
        TypeTag::Byte,
        TypeTag::Bool,
        TypeTag::Short,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::String,
        TypeTag::QString,
        TypeTag::IpAddress,
        TypeTag::Ipv6Address,
        TypeTag::MacAddress,
        TypeTag::Uuid,
        TypeTag::Pair,
        TypeTag::Vector,
        TypeTag::Data,
    ];

    /// Wire code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Short lowercase name, as accepted by [`TypeTag::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Byte => "byte",
            TypeTag::Bool => "bool",
            TypeTag::Short => "short",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::QString => "qstring",
            TypeTag::IpAddress => "ip",
            TypeTag::Ipv6Address => "ipv6",
            TypeTag::MacAddress => "mac",
            TypeTag::Uuid => "uuid",
            TypeTag::Pair => "pair",
            TypeTag::Vector => "vector",
            TypeTag::Data => "data",
        }
    }

    /// Scalars carried as plain text.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::QString
                | TypeTag::IpAddress
                | TypeTag::Ipv6Address
                | TypeTag::MacAddress
                | TypeTag::Uuid
        )
    }

    /// Numeric and boolean scalars.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeTag::Byte
                | TypeTag::Bool
                | TypeTag::Short
                | TypeTag::Int
                | TypeTag::Long
                | TypeTag::Float
                | TypeTag::Double
        )
    }

    /// Pair, vector and opaque data.
    pub fn is_composite(self) -> bool {
        matches!(self, TypeTag::Pair | TypeTag::Vector | TypeTag::Data)
    }
}

impl TryFrom<u32> for TypeTag {
    type Error = FrameError;

    fn try_from(code: u32) -> Result<Self> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.code() == code)
            .ok_or(FrameError::UnsupportedType(code))
    }
}

impl FromStr for TypeTag {
    type Err = FrameError;

    /// Parses a name (`qstring`, `int`, ...) or a numeric code (`9`).
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Ok(code) = lowered.parse::<u32>() {
            return TypeTag::try_from(code);
        }
        let alias = match lowered.as_str() {
            "ip_address" | "ipv4" => "ip",
            "ipv6_address" => "ipv6",
            "mac_address" => "mac",
            other => other,
        };
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.name() == alias)
            .ok_or_else(|| FrameError::InvalidFieldValue {
                field: "type tag",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed IPC argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum IpcData {
    Byte(u8),
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    QString(String),
    IpAddress(String),
    Ipv6Address(String),
    MacAddress(String),
    Uuid(String),
    Pair(Box<IpcData>, Box<IpcData>),
    Vector {
        element: TypeTag,
        items: Vec<IpcData>,
    },
    Data(Bytes),
    /// A numeric or boolean return whose text did not parse as its tag.
    /// Kept verbatim and re-encoded as-is.
    Opaque { tag: TypeTag, text: String },
}

impl IpcData {
    /// The tag written before this value on the wire.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            IpcData::Byte(_) => TypeTag::Byte,
            IpcData::Bool(_) => TypeTag::Bool,
            IpcData::Short(_) => TypeTag::Short,
            IpcData::Int(_) => TypeTag::Int,
            IpcData::Long(_) => TypeTag::Long,
            IpcData::Float(_) => TypeTag::Float,
            IpcData::Double(_) => TypeTag::Double,
            IpcData::String(_) => TypeTag::String,
            IpcData::QString(_) => TypeTag::QString,
            IpcData::IpAddress(_) => TypeTag::IpAddress,
            IpcData::Ipv6Address(_) => TypeTag::Ipv6Address,
            IpcData::MacAddress(_) => TypeTag::MacAddress,
            IpcData::Uuid(_) => TypeTag::Uuid,
            IpcData::Pair(..) => TypeTag::Pair,
            IpcData::Vector { .. } => TypeTag::Vector,
            IpcData::Data(_) => TypeTag::Data,
            IpcData::Opaque { tag, .. } => *tag,
        }
    }

    /// Borrow the text of a text-carried scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IpcData::String(s)
            | IpcData::QString(s)
            | IpcData::IpAddress(s)
            | IpcData::Ipv6Address(s)
            | IpcData::MacAddress(s)
            | IpcData::Uuid(s)
            | IpcData::Opaque { text: s, .. } => Some(s),
            _ => None,
        }
    }

    /// Build a scalar of type `tag` from its text form.
    pub fn from_text(tag: TypeTag, text: &str) -> Result<Self> {
        let invalid = || FrameError::InvalidFieldValue {
            field: tag.name(),
            value: text.to_string(),
        };
        let number = text.trim();
        Ok(match tag {
            TypeTag::Byte => IpcData::Byte(number.parse().map_err(|_| invalid())?),
            TypeTag::Bool if text.is_empty() => IpcData::Bool(false),
            TypeTag::Bool => IpcData::Bool(parse_bool(number).ok_or_else(invalid)?),
            TypeTag::Short => IpcData::Short(number.parse().map_err(|_| invalid())?),
            TypeTag::Int => IpcData::Int(number.parse().map_err(|_| invalid())?),
            TypeTag::Long => IpcData::Long(number.parse().map_err(|_| invalid())?),
            TypeTag::Float => IpcData::Float(number.parse().map_err(|_| invalid())?),
            TypeTag::Double => IpcData::Double(number.parse().map_err(|_| invalid())?),
            TypeTag::String => IpcData::String(text.to_string()),
            TypeTag::QString => IpcData::QString(text.to_string()),
            TypeTag::IpAddress => IpcData::IpAddress(text.to_string()),
            TypeTag::Ipv6Address => IpcData::Ipv6Address(text.to_string()),
            TypeTag::MacAddress => IpcData::MacAddress(text.to_string()),
            TypeTag::Uuid => IpcData::Uuid(text.to_string()),
            TypeTag::Pair | TypeTag::Vector | TypeTag::Data => {
                return Err(FrameError::UnsupportedType(tag.code()))
            }
        })
    }

    /// Parse a `TYPE:VALUE` argument, e.g. `qstring:Hello` or `int:3`.
    pub fn parse_arg(arg: &str) -> Result<Self> {
        let (tag, value) = arg
            .split_once(':')
            .ok_or_else(|| FrameError::InvalidFieldValue {
                field: "argument",
                value: arg.to_string(),
            })?;
        IpcData::from_text(tag.parse()?, value)
    }

    /// Append the type tag field followed by the value.
    ///
    /// Nothing is written if the value cannot be encoded.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let mut value = BytesMut::new();
        self.encode_value(&mut value)?;
        write_field(&self.type_tag().code().to_string(), dst);
        dst.extend_from_slice(&value);
        Ok(())
    }

    /// Append the value without its type tag.
    pub fn encode_value(&self, dst: &mut BytesMut) -> Result<()> {
        match self {
            IpcData::Vector { element, items } => {
                write_field(&items.len().to_string(), dst);
                write_field(&element.code().to_string(), dst);
                for item in items {
                    if item.type_tag() != *element {
                        return Err(FrameError::InvalidFieldValue {
                            field: "vector element",
                            value: item.to_string(),
                        });
                    }
                    item.encode_value(dst)?;
                }
                Ok(())
            }
            IpcData::Pair(..) | IpcData::Data(_) => {
                Err(FrameError::UnsupportedType(self.type_tag().code()))
            }
            scalar => {
                write_field(&scalar.to_string(), dst);
                Ok(())
            }
        }
    }

    /// Read a type tag field and then the value it announces.
    pub fn decode(cursor: &mut FieldCursor<'_>) -> Result<Self> {
        let code: u32 = cursor.read_int("type id")?;
        IpcData::decode_value(TypeTag::try_from(code)?, cursor)
    }

    /// Read a value of a known type.
    ///
    /// PAIR and DATA have no known wire form and fail with
    /// [`FrameError::UnsupportedType`] rather than skipping bytes. Numeric
    /// text that does not parse as its tag comes back as
    /// [`IpcData::Opaque`]. Vectors nested deeper than [`MAX_VECTOR_DEPTH`]
    /// are rejected.
    pub fn decode_value(tag: TypeTag, cursor: &mut FieldCursor<'_>) -> Result<Self> {
        IpcData::decode_nested(tag, cursor, 0)
    }

    fn decode_nested(tag: TypeTag, cursor: &mut FieldCursor<'_>, depth: usize) -> Result<Self> {
        match tag {
            TypeTag::Vector => {
                if depth >= MAX_VECTOR_DEPTH {
                    return Err(FrameError::InvalidFieldValue {
                        field: "vector nesting",
                        value: format!("deeper than {MAX_VECTOR_DEPTH}"),
                    });
                }
                let len: usize = cursor.read_int("vector length")?;
                let code: u32 = cursor.read_int("vector element type")?;
                let element = TypeTag::try_from(code)?;
                // Every element takes at least one byte.
                let mut items = Vec::with_capacity(len.min(cursor.remaining()));
                for _ in 0..len {
                    items.push(IpcData::decode_nested(element, cursor, depth + 1)?);
                }
                Ok(IpcData::Vector { element, items })
            }
            TypeTag::Pair | TypeTag::Data => Err(FrameError::UnsupportedType(tag.code())),
            scalar => {
                let text = cursor.read_str(scalar.name())?;
                match IpcData::from_text(scalar, &text) {
                    Err(FrameError::InvalidFieldValue { .. }) if scalar.is_numeric() => {
                        Ok(IpcData::Opaque { tag: scalar, text })
                    }
                    decoded => decoded,
                }
            }
        }
    }
}

impl fmt::Display for IpcData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcData::Byte(v) => write!(f, "{v}"),
            IpcData::Bool(v) => write!(f, "{v}"),
            IpcData::Short(v) => write!(f, "{v}"),
            IpcData::Int(v) => write!(f, "{v}"),
            IpcData::Long(v) => write!(f, "{v}"),
            IpcData::Float(v) => write!(f, "{v}"),
            IpcData::Double(v) => write!(f, "{v}"),
            IpcData::String(s)
            | IpcData::QString(s)
            | IpcData::IpAddress(s)
            | IpcData::Ipv6Address(s)
            | IpcData::MacAddress(s)
            | IpcData::Uuid(s)
            | IpcData::Opaque { text: s, .. } => f.write_str(s),
            IpcData::Pair(first, second) => write!(f, "({first}, {second})"),
            IpcData::Vector { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            IpcData::Data(bytes) => write!(f, "<data {} bytes>", bytes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &IpcData) -> Vec<u8> {
        let mut buf = BytesMut::new();
        value.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn tags_match_wire_codes() {
        assert_eq!(TypeTag::Byte.code(), 1);
        assert_eq!(TypeTag::String.code(), 8);
        assert_eq!(TypeTag::QString.code(), 9);
        assert_eq!(TypeTag::Uuid.code(), 13);
        assert_eq!(TypeTag::Pair.code(), 14);
        assert_eq!(TypeTag::Vector.code(), 15);
        assert_eq!(TypeTag::Data.code(), 16);
        for (i, tag) in TypeTag::ALL.iter().enumerate() {
            assert_eq!(tag.code(), i as u32 + 1);
            assert_eq!(TypeTag::try_from(tag.code()).unwrap(), *tag);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        assert!(matches!(
            TypeTag::try_from(0),
            Err(FrameError::UnsupportedType(0))
        ));
        assert!(matches!(
            TypeTag::try_from(17),
            Err(FrameError::UnsupportedType(17))
        ));
    }

    #[test]
    fn tag_names_parse() {
        assert_eq!("qstring".parse::<TypeTag>().unwrap(), TypeTag::QString);
        assert_eq!("INT".parse::<TypeTag>().unwrap(), TypeTag::Int);
        assert_eq!("9".parse::<TypeTag>().unwrap(), TypeTag::QString);
        assert_eq!("mac_address".parse::<TypeTag>().unwrap(), TypeTag::MacAddress);
        assert!("nope".parse::<TypeTag>().is_err());
    }

    #[test]
    fn text_scalars_roundtrip() {
        for value in [
            IpcData::String("hello".to_string()),
            IpcData::QString("Hello from PTMP".to_string()),
            IpcData::Uuid("{6f1c0a9e-3b4d-4b7e-9a51-0c2d7e8f1a22}".to_string()),
            IpcData::IpAddress("192.168.0.1".to_string()),
            IpcData::MacAddress("0001.4223.B6A1".to_string()),
            IpcData::String(String::new()),
        ] {
            let wire = encoded(&value);
            let mut cursor = FieldCursor::new(&wire);
            assert_eq!(IpcData::decode(&mut cursor).unwrap(), value);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn scalar_wire_form() {
        assert_eq!(encoded(&IpcData::QString("hi".into())), b"9\0hi\0");
        assert_eq!(encoded(&IpcData::Int(-3)), b"4\0-3\0");
        assert_eq!(encoded(&IpcData::Bool(true)), b"2\0true\0");
        assert_eq!(encoded(&IpcData::Double(1.5)), b"7\01.5\0");
    }

    #[test]
    fn numeric_scalars_decode_from_text() {
        let mut cursor = FieldCursor::new(b"1\07\03\0-2\05\09000000000\06\00.25\0");
        assert_eq!(IpcData::decode(&mut cursor).unwrap(), IpcData::Byte(7));
        assert_eq!(IpcData::decode(&mut cursor).unwrap(), IpcData::Short(-2));
        assert_eq!(
            IpcData::decode(&mut cursor).unwrap(),
            IpcData::Long(9_000_000_000)
        );
        assert_eq!(IpcData::decode(&mut cursor).unwrap(), IpcData::Float(0.25));
        assert!(cursor.is_empty());
    }

    #[test]
    fn bool_value_empty_is_false() {
        let mut cursor = FieldCursor::new(b"2\0\0");
        assert_eq!(IpcData::decode(&mut cursor).unwrap(), IpcData::Bool(false));
    }

    #[test]
    fn unparseable_numeric_return_keeps_text() {
        let mut cursor = FieldCursor::new(b"4\0abc\01\0-1\0");
        assert_eq!(
            IpcData::decode(&mut cursor).unwrap(),
            IpcData::Opaque {
                tag: TypeTag::Int,
                text: "abc".into()
            }
        );
        let byte = IpcData::decode(&mut cursor).unwrap();
        assert_eq!(
            byte,
            IpcData::Opaque {
                tag: TypeTag::Byte,
                text: "-1".into()
            }
        );
        assert_eq!(byte.type_tag(), TypeTag::Byte);
        assert_eq!(byte.to_string(), "-1");
        assert!(cursor.is_empty());

        // Re-encodes exactly as received.
        assert_eq!(encoded(&byte), b"1\0-1\0");
    }

    #[test]
    fn numeric_garbage_is_rejected_as_argument() {
        assert!(matches!(
            IpcData::from_text(TypeTag::Int, "abc"),
            Err(FrameError::InvalidFieldValue { field: "int", .. })
        ));
        assert!(IpcData::parse_arg("byte:-1").is_err());
    }

    #[test]
    fn deeply_nested_vectors_are_rejected() {
        let mut wire = b"15\0".to_vec();
        for _ in 0..200_000 {
            wire.extend_from_slice(b"1\015\0");
        }
        wire.extend_from_slice(b"0\08\0");

        let mut cursor = FieldCursor::new(&wire);
        assert!(matches!(
            IpcData::decode(&mut cursor),
            Err(FrameError::InvalidFieldValue {
                field: "vector nesting",
                ..
            })
        ));
    }

    #[test]
    fn nesting_within_limit_decodes() {
        let mut wire = b"15\0".to_vec();
        for _ in 0..MAX_VECTOR_DEPTH - 1 {
            wire.extend_from_slice(b"1\015\0");
        }
        wire.extend_from_slice(b"1\04\09\0");

        let mut cursor = FieldCursor::new(&wire);
        let value = IpcData::decode(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        let mut depth = 0;
        let mut current = &value;
        while let IpcData::Vector { items, .. } = current {
            depth += 1;
            current = &items[0];
        }
        assert_eq!(depth, MAX_VECTOR_DEPTH);
        assert_eq!(current, &IpcData::Int(9));
    }

    #[test]
    fn vector_roundtrip() {
        let value = IpcData::Vector {
            element: TypeTag::QString,
            items: vec![IpcData::QString("a".into()), IpcData::QString("b".into())],
        };
        let wire = encoded(&value);
        assert_eq!(wire, b"15\02\09\0a\0b\0");

        let mut cursor = FieldCursor::new(&wire);
        assert_eq!(IpcData::decode(&mut cursor).unwrap(), value);
    }

    #[test]
    fn empty_vector_decodes() {
        let mut cursor = FieldCursor::new(b"15\00\08\0");
        assert_eq!(
            IpcData::decode(&mut cursor).unwrap(),
            IpcData::Vector {
                element: TypeTag::String,
                items: vec![]
            }
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn vector_with_mismatched_element_is_rejected() {
        let value = IpcData::Vector {
            element: TypeTag::Int,
            items: vec![IpcData::QString("x".into())],
        };
        let mut buf = BytesMut::new();
        assert!(value.encode(&mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn truncated_vector_reports_end_of_stream() {
        let mut cursor = FieldCursor::new(b"15\03\08\0a\0");
        assert!(matches!(
            IpcData::decode(&mut cursor),
            Err(FrameError::UnexpectedEndOfStream { .. })
        ));
    }

    #[test]
    fn pair_and_data_are_unsupported() {
        for code in [b"14\0x\0".as_ref(), b"16\0x\0".as_ref()] {
            let mut cursor = FieldCursor::new(code);
            let err = IpcData::decode(&mut cursor).unwrap_err();
            assert!(matches!(err, FrameError::UnsupportedType(14 | 16)));
            // Only the tag field was consumed; the value bytes are untouched.
            assert_eq!(cursor.remaining(), 2);
        }

        let pair = IpcData::Pair(Box::new(IpcData::Int(1)), Box::new(IpcData::Int(2)));
        let mut buf = BytesMut::new();
        assert!(matches!(
            pair.encode(&mut buf),
            Err(FrameError::UnsupportedType(14))
        ));
        assert!(matches!(
            IpcData::Data(Bytes::from_static(b"raw")).encode(&mut buf),
            Err(FrameError::UnsupportedType(16))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn parse_arg_forms() {
        assert_eq!(
            IpcData::parse_arg("qstring:Hello: world").unwrap(),
            IpcData::QString("Hello: world".into())
        );
        assert_eq!(IpcData::parse_arg("int:42").unwrap(), IpcData::Int(42));
        assert_eq!(IpcData::parse_arg("bool:true").unwrap(), IpcData::Bool(true));
        assert!(IpcData::parse_arg("no-separator").is_err());
        assert!(IpcData::parse_arg("int:x").is_err());
        assert!(matches!(
            IpcData::parse_arg("pair:1"),
            Err(FrameError::UnsupportedType(14))
        ));
    }

    #[test]
    fn display_renders_composites() {
        let value = IpcData::Vector {
            element: TypeTag::Int,
            items: vec![IpcData::Int(1), IpcData::Int(2)],
        };
        assert_eq!(value.to_string(), "[1, 2]");
        assert_eq!(IpcData::Data(Bytes::from_static(b"ab")).to_string(), "<data 2 bytes>");
    }
}

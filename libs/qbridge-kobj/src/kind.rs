use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KError;

// ═══════════════════════════════════════════════════════════════
//  Kind
// ═══════════════════════════════════════════════════════════════

/// Element kind shared by atoms and vectors.
///
/// The discriminant order is significant: it is the order in which the
/// static tag identifiers are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Char,
    Symbol,
    Month,
    Date,
    Datetime,
    Minute,
    Second,
    Time,
}

impl Kind {
    pub const ALL: [Kind; 15] = [
        Kind::Bool,
        Kind::Byte,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::Float32,
        Kind::Float64,
        Kind::Char,
        Kind::Symbol,
        Kind::Month,
        Kind::Date,
        Kind::Datetime,
        Kind::Minute,
        Kind::Second,
        Kind::Time,
    ];

    /// Positive engine code of the vector form. Atoms use the negation.
    pub const fn code(self) -> i8 {
        match self {
            Kind::Bool => 1,
            Kind::Byte => 4,
            Kind::Int16 => 5,
            Kind::Int32 => 6,
            Kind::Int64 => 7,
            Kind::Float32 => 8,
            Kind::Float64 => 9,
            Kind::Char => 10,
            Kind::Symbol => 11,
            Kind::Month => 13,
            Kind::Date => 14,
            Kind::Datetime => 15,
            Kind::Minute => 17,
            Kind::Second => 18,
            Kind::Time => 19,
        }
    }

    pub const fn from_code(code: i8) -> Option<Kind> {
        Some(match code {
            1 => Kind::Bool,
            4 => Kind::Byte,
            5 => Kind::Int16,
            6 => Kind::Int32,
            7 => Kind::Int64,
            8 => Kind::Float32,
            9 => Kind::Float64,
            10 => Kind::Char,
            11 => Kind::Symbol,
            13 => Kind::Month,
            14 => Kind::Date,
            15 => Kind::Datetime,
            17 => Kind::Minute,
            18 => Kind::Second,
            19 => Kind::Time,
            _ => return None,
        })
    }

    /// Element width in bytes. `None` for symbols, which are interned
    /// references rather than fixed-width data.
    pub const fn width(self) -> Option<usize> {
        match self {
            Kind::Bool | Kind::Byte | Kind::Char => Some(1),
            Kind::Int16 => Some(2),
            Kind::Int32
            | Kind::Month
            | Kind::Date
            | Kind::Minute
            | Kind::Second
            | Kind::Time
            | Kind::Float32 => Some(4),
            Kind::Int64 | Kind::Float64 | Kind::Datetime => Some(8),
            Kind::Symbol => None,
        }
    }

    /// Kinds whose atoms are stored in the 32-bit integer field.
    pub const fn is_int32_family(self) -> bool {
        matches!(
            self,
            Kind::Int32 | Kind::Month | Kind::Date | Kind::Minute | Kind::Second | Kind::Time
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Byte => "byte",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Char => "char",
            Kind::Symbol => "symbol",
            Kind::Month => "month",
            Kind::Date => "date",
            Kind::Datetime => "datetime",
            Kind::Minute => "minute",
            Kind::Second => "second",
            Kind::Time => "time",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════
//  TypeTag
// ═══════════════════════════════════════════════════════════════

/// Shape of an engine object, decoded from its signed type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Atom(Kind),
    Vector(Kind),
    MixedList,
    Table,
    Dict,
    Lambda,
    Unit,
    Operator,
    Projection,
    Error,
}

impl TypeTag {
    pub const MIXED_LIST: i8 = 0;
    pub const TABLE: i8 = 98;
    pub const DICT: i8 = 99;
    pub const LAMBDA: i8 = 100;
    pub const UNIT: i8 = 101;
    pub const OPERATOR: i8 = 102;
    pub const PROJECTION: i8 = 104;
    pub const ERROR: i8 = -128;

    pub const fn code(self) -> i8 {
        match self {
            TypeTag::Atom(kind) => -kind.code(),
            TypeTag::Vector(kind) => kind.code(),
            TypeTag::MixedList => Self::MIXED_LIST,
            TypeTag::Table => Self::TABLE,
            TypeTag::Dict => Self::DICT,
            TypeTag::Lambda => Self::LAMBDA,
            TypeTag::Unit => Self::UNIT,
            TypeTag::Operator => Self::OPERATOR,
            TypeTag::Projection => Self::PROJECTION,
            TypeTag::Error => Self::ERROR,
        }
    }

    /// `None` for any code outside the known set.
    pub const fn from_code(code: i8) -> Option<TypeTag> {
        match code {
            Self::MIXED_LIST => Some(TypeTag::MixedList),
            Self::TABLE => Some(TypeTag::Table),
            Self::DICT => Some(TypeTag::Dict),
            Self::LAMBDA => Some(TypeTag::Lambda),
            Self::UNIT => Some(TypeTag::Unit),
            Self::OPERATOR => Some(TypeTag::Operator),
            Self::PROJECTION => Some(TypeTag::Projection),
            Self::ERROR => Some(TypeTag::Error),
            c if c < 0 => match Kind::from_code(-c) {
                Some(kind) => Some(TypeTag::Atom(kind)),
                None => None,
            },
            c => match Kind::from_code(c) {
                Some(kind) => Some(TypeTag::Vector(kind)),
                None => None,
            },
        }
    }

    pub const fn is_function(self) -> bool {
        matches!(self, TypeTag::Lambda | TypeTag::Operator | TypeTag::Projection)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Atom(kind) => write!(f, "{kind} atom (type {})", self.code()),
            TypeTag::Vector(kind) => write!(f, "{kind} vector (type {})", self.code()),
            TypeTag::MixedList => f.write_str("mixed list (type 0)"),
            TypeTag::Table => f.write_str("table (type 98)"),
            TypeTag::Dict => f.write_str("dictionary (type 99)"),
            TypeTag::Lambda => f.write_str("lambda (type 100)"),
            TypeTag::Unit => f.write_str("unit (type 101)"),
            TypeTag::Operator => f.write_str("q operator (type 102)"),
            TypeTag::Projection => f.write_str("partial application (type 104)"),
            TypeTag::Error => f.write_str("error (type -128)"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Attribute
// ═══════════════════════════════════════════════════════════════

/// Descriptive ordering metadata. Never checked against the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Attribute {
    #[default]
    None = 0,
    Sorted = 1,
    Unique = 2,
    Parted = 3,
    Grouped = 4,
}

impl Attribute {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Attribute {
    type Error = KError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Attribute::None),
            1 => Ok(Attribute::Sorted),
            2 => Ok(Attribute::Unique),
            3 => Ok(Attribute::Parted),
            4 => Ok(Attribute::Grouped),
            other => Err(KError::InvalidAttribute(other)),
        }
    }
}

use serde::{Deserialize, Serialize};

use qbridge_kobj::{Attribute, Kind};

use crate::tag_map::StaticTag;

/// Single value of one kind, in the kind's native representation.
///
/// Temporal payloads are engine units and are carried through untouched:
/// month/date/minute/second/time as 32-bit counts, datetime as a day count
/// with the time of day in the fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Char(u8),
    Symbol(String),
    Month(i32),
    Date(i32),
    Datetime(f64),
    Minute(i32),
    Second(i32),
    Time(i32),
}

impl Scalar {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Bool(_) => Kind::Bool,
            Scalar::Byte(_) => Kind::Byte,
            Scalar::Int16(_) => Kind::Int16,
            Scalar::Int32(_) => Kind::Int32,
            Scalar::Int64(_) => Kind::Int64,
            Scalar::Float32(_) => Kind::Float32,
            Scalar::Float64(_) => Kind::Float64,
            Scalar::Char(_) => Kind::Char,
            Scalar::Symbol(_) => Kind::Symbol,
            Scalar::Month(_) => Kind::Month,
            Scalar::Date(_) => Kind::Date,
            Scalar::Datetime(_) => Kind::Datetime,
            Scalar::Minute(_) => Kind::Minute,
            Scalar::Second(_) => Kind::Second,
            Scalar::Time(_) => Kind::Time,
        }
    }
}

/// Homogeneous owned buffer, one variant per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorData {
    Bool(Vec<bool>),
    Byte(Vec<u8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Char(Vec<u8>),
    Symbol(Vec<String>),
    Month(Vec<i32>),
    Date(Vec<i32>),
    Datetime(Vec<f64>),
    Minute(Vec<i32>),
    Second(Vec<i32>),
    Time(Vec<i32>),
}

impl VectorData {
    pub fn kind(&self) -> Kind {
        match self {
            VectorData::Bool(_) => Kind::Bool,
            VectorData::Byte(_) => Kind::Byte,
            VectorData::Int16(_) => Kind::Int16,
            VectorData::Int32(_) => Kind::Int32,
            VectorData::Int64(_) => Kind::Int64,
            VectorData::Float32(_) => Kind::Float32,
            VectorData::Float64(_) => Kind::Float64,
            VectorData::Char(_) => Kind::Char,
            VectorData::Symbol(_) => Kind::Symbol,
            VectorData::Month(_) => Kind::Month,
            VectorData::Date(_) => Kind::Date,
            VectorData::Datetime(_) => Kind::Datetime,
            VectorData::Minute(_) => Kind::Minute,
            VectorData::Second(_) => Kind::Second,
            VectorData::Time(_) => Kind::Time,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VectorData::Bool(v) => v.len(),
            VectorData::Byte(v) | VectorData::Char(v) => v.len(),
            VectorData::Int16(v) => v.len(),
            VectorData::Int32(v)
            | VectorData::Month(v)
            | VectorData::Date(v)
            | VectorData::Minute(v)
            | VectorData::Second(v)
            | VectorData::Time(v) => v.len(),
            VectorData::Int64(v) => v.len(),
            VectorData::Float32(v) => v.len(),
            VectorData::Float64(v) | VectorData::Datetime(v) => v.len(),
            VectorData::Symbol(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    #[serde(default)]
    pub attribute: Attribute,
    pub data: VectorData,
}

/// Column names of a table: a symbol vector with its own attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolVector {
    #[serde(default)]
    pub attribute: Attribute,
    pub names: Vec<String>,
}

/// Column-oriented table. `columns[i]` holds the data of `column_names[i]`.
///
/// Equal column lengths are trusted from the engine, not checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub column_names: SymbolVector,
    pub columns: Vec<StaticValue>,
    #[serde(default)]
    pub attribute: Attribute,
}

impl Table {
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        columns: Vec<StaticValue>,
    ) -> Self {
        Self {
            column_names: SymbolVector {
                attribute: Attribute::None,
                names: names.into_iter().map(Into::into).collect(),
            },
            columns,
            attribute: Attribute::None,
        }
    }

    /// Row count taken from the first column.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, StaticValue::count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dict {
    pub keys: Box<StaticValue>,
    pub values: Box<StaticValue>,
    #[serde(default)]
    pub attribute: Attribute,
}

/// Application-facing value tree.
///
/// There is no error case: an engine error never becomes data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaticValue {
    Scalar(Scalar),
    Vector(Vector),
    MixedList(Vec<StaticValue>),
    Table(Table),
    Dict(Dict),
    Unit,
}

impl StaticValue {
    pub fn tag(&self) -> StaticTag {
        match self {
            StaticValue::Scalar(s) => StaticTag::Scalar(s.kind()),
            StaticValue::Vector(v) => StaticTag::Vector(v.data.kind()),
            StaticValue::MixedList(_) => StaticTag::MixedList,
            StaticValue::Table(_) => StaticTag::Table,
            StaticValue::Dict(_) => StaticTag::Dict,
            StaticValue::Unit => StaticTag::Unit,
        }
    }

    /// Vector without an attribute.
    pub fn vector(data: VectorData) -> Self {
        StaticValue::Vector(Vector { attribute: Attribute::None, data })
    }

    pub fn symbols<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::vector(VectorData::Symbol(names.into_iter().map(Into::into).collect()))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        StaticValue::Scalar(Scalar::Symbol(name.into()))
    }

    pub fn dict(keys: StaticValue, values: StaticValue) -> Self {
        StaticValue::Dict(Dict {
            keys: Box::new(keys),
            values: Box::new(values),
            attribute: Attribute::None,
        })
    }

    /// Keyed table: key columns on the left, value columns on the right.
    pub fn keyed_table(keys: Table, values: Table) -> Self {
        Self::dict(StaticValue::Table(keys), StaticValue::Table(values))
    }

    pub fn is_keyed_table(&self) -> bool {
        matches!(
            self,
            StaticValue::Dict(Dict { keys, values, .. })
                if matches!(**keys, StaticValue::Table(_))
                    && matches!(**values, StaticValue::Table(_))
        )
    }

    /// Item count as the engine reports it: 1 for scalars, element count for
    /// vectors and lists, row count for tables, key count for dictionaries.
    pub fn count(&self) -> usize {
        match self {
            StaticValue::Scalar(_) => 1,
            StaticValue::Vector(v) => v.data.len(),
            StaticValue::MixedList(items) => items.len(),
            StaticValue::Table(t) => t.row_count(),
            StaticValue::Dict(d) => d.keys.count(),
            StaticValue::Unit => 0,
        }
    }

    pub fn attribute(&self) -> Attribute {
        match self {
            StaticValue::Vector(v) => v.attribute,
            StaticValue::Table(t) => t.attribute,
            StaticValue::Dict(d) => d.attribute,
            _ => Attribute::None,
        }
    }

    /// Replace the attribute of a vector, table or dictionary. Other values
    /// carry none and are returned unchanged.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        match &mut self {
            StaticValue::Vector(v) => v.attribute = attribute,
            StaticValue::Table(t) => t.attribute = attribute,
            StaticValue::Dict(d) => d.attribute = attribute,
            _ => {}
        }
        self
    }
}

impl From<Scalar> for StaticValue {
    fn from(s: Scalar) -> Self {
        StaticValue::Scalar(s)
    }
}

impl From<VectorData> for StaticValue {
    fn from(data: VectorData) -> Self {
        StaticValue::vector(data)
    }
}

impl From<Table> for StaticValue {
    fn from(t: Table) -> Self {
        StaticValue::Table(t)
    }
}

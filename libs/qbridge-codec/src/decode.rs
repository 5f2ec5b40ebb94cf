use qbridge_api::tag_map::{self, StaticTag};
use qbridge_api::{BridgeError, Dict, Scalar, StaticValue, SymbolVector, Table, Vector, VectorData};
use qbridge_kobj::{Atom, Kind, TypeTag, K};

/// Convert an engine object into an owned `StaticValue`.
///
/// An error object anywhere in the tree aborts the whole conversion with
/// `RemoteError`; no partial value is returned.
pub fn decode(k: &K) -> Result<StaticValue, BridgeError> {
    let code = k.type_code();
    let tag = TypeTag::from_code(code)
        .ok_or(BridgeError::InvalidTag { code, context: "decode" })?;

    if tag == TypeTag::Error {
        let message = k.error_message().unwrap_or_default();
        tracing::debug!(error = %message, "engine error object, aborting decode");
        return Err(BridgeError::RemoteError(message.to_string()));
    }

    match tag_map::static_tag(tag)? {
        StaticTag::Scalar(kind) => decode_atom(k, kind).map(StaticValue::Scalar),
        StaticTag::Vector(kind) => decode_vector(k, kind).map(StaticValue::Vector),
        StaticTag::MixedList => decode_list(k).map(StaticValue::MixedList),
        StaticTag::Table => decode_table(k).map(StaticValue::Table),
        StaticTag::Dict => decode_dict(k).map(StaticValue::Dict),
        StaticTag::Unit => Ok(StaticValue::Unit),
    }
}

fn malformed(k: &K, context: &'static str) -> BridgeError {
    BridgeError::InvalidTag { code: k.type_code(), context }
}

fn decode_atom(k: &K, kind: Kind) -> Result<Scalar, BridgeError> {
    let atom = k.atom().ok_or_else(|| malformed(k, "atom without payload"))?;
    let scalar = match (kind, atom) {
        (Kind::Bool, Atom::Bool(v)) => Scalar::Bool(*v),
        (Kind::Byte, Atom::Byte(v)) => Scalar::Byte(*v),
        (Kind::Int16, Atom::Int16(v)) => Scalar::Int16(*v),
        (Kind::Int32, Atom::Int32(v)) => Scalar::Int32(*v),
        (Kind::Month, Atom::Int32(v)) => Scalar::Month(*v),
        (Kind::Date, Atom::Int32(v)) => Scalar::Date(*v),
        (Kind::Minute, Atom::Int32(v)) => Scalar::Minute(*v),
        (Kind::Second, Atom::Int32(v)) => Scalar::Second(*v),
        (Kind::Time, Atom::Int32(v)) => Scalar::Time(*v),
        (Kind::Int64, Atom::Int64(v)) => Scalar::Int64(*v),
        (Kind::Float32, Atom::Float32(v)) => Scalar::Float32(*v),
        (Kind::Float64, Atom::Float64(v)) => Scalar::Float64(*v),
        (Kind::Datetime, Atom::Float64(v)) => Scalar::Datetime(*v),
        (Kind::Char, Atom::Char(v)) => Scalar::Char(*v),
        (Kind::Symbol, Atom::Symbol(s)) => Scalar::Symbol(s.as_str().to_owned()),
        _ => return Err(malformed(k, "atom payload")),
    };
    Ok(scalar)
}

/// Copy fixed-width elements out of a raw engine buffer.
fn copy_elements<T: bytemuck::AnyBitPattern + bytemuck::NoUninit>(raw: &[u8]) -> Vec<T> {
    bytemuck::pod_collect_to_vec(raw)
}

fn decode_vector(k: &K, kind: Kind) -> Result<Vector, BridgeError> {
    let attribute = k.attribute()?;
    let raw = || k.bytes().ok_or_else(|| malformed(k, "vector without buffer"));

    let data = match kind {
        Kind::Symbol => {
            let syms = k.symbols().ok_or_else(|| malformed(k, "symbol vector"))?;
            VectorData::Symbol(syms.iter().map(|s| s.as_str().to_owned()).collect())
        }
        Kind::Bool => VectorData::Bool(raw()?.iter().map(|&b| b != 0).collect()),
        Kind::Byte => VectorData::Byte(raw()?.to_vec()),
        Kind::Char => VectorData::Char(raw()?.to_vec()),
        Kind::Int16 => VectorData::Int16(copy_elements(raw()?)),
        Kind::Int32 => VectorData::Int32(copy_elements(raw()?)),
        Kind::Month => VectorData::Month(copy_elements(raw()?)),
        Kind::Date => VectorData::Date(copy_elements(raw()?)),
        Kind::Minute => VectorData::Minute(copy_elements(raw()?)),
        Kind::Second => VectorData::Second(copy_elements(raw()?)),
        Kind::Time => VectorData::Time(copy_elements(raw()?)),
        Kind::Int64 => VectorData::Int64(copy_elements(raw()?)),
        Kind::Float32 => VectorData::Float32(copy_elements(raw()?)),
        Kind::Float64 => VectorData::Float64(copy_elements(raw()?)),
        Kind::Datetime => VectorData::Datetime(copy_elements(raw()?)),
    };
    Ok(Vector { attribute, data })
}

fn decode_list(k: &K) -> Result<Vec<StaticValue>, BridgeError> {
    let items = k.children().ok_or_else(|| malformed(k, "mixed list"))?;
    tracing::trace!(len = items.len(), "decoding mixed list");

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let value = decode(item)?;
        out.push(value);
    }
    Ok(out)
}

fn decode_table(k: &K) -> Result<Table, BridgeError> {
    let attribute = k.attribute()?;
    let dict = match k.children() {
        Some([dict]) => dict,
        _ => return Err(malformed(k, "table without column dictionary")),
    };
    let (names, columns) = match dict.children() {
        Some([names, columns]) => (names, columns),
        _ => return Err(malformed(dict, "table column dictionary")),
    };
    tracing::trace!(columns = names.len(), "decoding table");

    let column_names = match decode(names)? {
        StaticValue::Vector(Vector { attribute, data: VectorData::Symbol(names) }) => {
            SymbolVector { attribute, names }
        }
        _ => return Err(malformed(names, "table column names")),
    };
    let columns = match decode(columns)? {
        StaticValue::MixedList(columns) => columns,
        _ => return Err(malformed(columns, "table columns")),
    };
    Ok(Table { column_names, columns, attribute })
}

fn decode_dict(k: &K) -> Result<Dict, BridgeError> {
    let attribute = k.attribute()?;
    let (keys, values) = match k.children() {
        Some([keys, values]) => (keys, values),
        _ => return Err(malformed(k, "dictionary")),
    };
    tracing::trace!(keys = keys.type_code(), values = values.type_code(), "decoding dictionary");

    let keys = decode(keys)?;
    let values = decode(values)?;
    Ok(Dict { keys: Box::new(keys), values: Box::new(values), attribute })
}

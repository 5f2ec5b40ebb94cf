use qbridge_api::{intern, BridgeError, Dict, Scalar, StaticValue, Table, Vector, VectorData};
use qbridge_kobj::{Attribute, KError, Kind, TypeTag, K};

/// Build a freshly owned engine object from a `StaticValue`.
///
/// The caller owns the result and hands it to the engine exactly once.
/// Intermediate objects of a failed conversion are released on the way out.
pub fn encode(value: &StaticValue) -> Result<K, BridgeError> {
    match value {
        StaticValue::Scalar(s) => encode_scalar(s),
        StaticValue::Vector(v) => encode_vector(v),
        StaticValue::MixedList(items) => encode_list(items),
        StaticValue::Table(t) => encode_table(t),
        StaticValue::Dict(d) => encode_dict(d),
        StaticValue::Unit => Ok(K::unit()),
    }
}

fn encode_scalar(s: &Scalar) -> Result<K, BridgeError> {
    let k = match s {
        Scalar::Bool(v) => K::bool(*v),
        Scalar::Byte(v) => K::byte(*v),
        Scalar::Int16(v) => K::short(*v),
        Scalar::Int32(v) => K::int(*v),
        Scalar::Int64(v) => K::long(*v),
        Scalar::Float32(v) => K::real(*v),
        Scalar::Float64(v) => K::float(*v),
        Scalar::Char(v) => K::char(*v),
        Scalar::Symbol(v) => K::symbol(intern(v)),
        Scalar::Datetime(v) => K::datetime(*v),
        Scalar::Time(v) => K::time(*v),
        Scalar::Month(v) | Scalar::Date(v) | Scalar::Minute(v) | Scalar::Second(v) => {
            let mut k = K::int(*v);
            k.retype_atom(s.kind())?;
            k
        }
    };
    Ok(k)
}

/// Zeroed vector of the right length, filled by a bulk copy.
fn filled<T: bytemuck::NoUninit>(kind: Kind, items: &[T]) -> Result<K, BridgeError> {
    let mut k = K::vector(kind, items.len());
    let buf = k
        .bytes_mut()
        .ok_or(KError::Shape { op: "fill", code: TypeTag::Vector(kind).code() })?;
    buf.copy_from_slice(bytemuck::cast_slice(items));
    Ok(k)
}

fn symbol_vector(names: &[String], attribute: Attribute) -> Result<K, BridgeError> {
    let mut k = K::vector(Kind::Symbol, 0);
    for name in names {
        // Engine symbols compare by reference: intern before storing.
        let sym = intern(name);
        k.push_symbol(sym)?;
    }
    // Appends may have moved the vector; stamp it now.
    k.set_attribute(attribute);
    Ok(k)
}

fn encode_vector(v: &Vector) -> Result<K, BridgeError> {
    let kind = v.data.kind();
    let mut k = match &v.data {
        VectorData::Symbol(names) => return symbol_vector(names, v.attribute),
        VectorData::Bool(items) => {
            let bytes: Vec<u8> = items.iter().map(|&b| u8::from(b)).collect();
            filled(kind, &bytes)?
        }
        VectorData::Byte(items) | VectorData::Char(items) => filled(kind, items)?,
        VectorData::Int16(items) => filled(kind, items)?,
        VectorData::Int32(items)
        | VectorData::Month(items)
        | VectorData::Date(items)
        | VectorData::Minute(items)
        | VectorData::Second(items)
        | VectorData::Time(items) => filled(kind, items)?,
        VectorData::Int64(items) => filled(kind, items)?,
        VectorData::Float32(items) => filled(kind, items)?,
        VectorData::Float64(items) | VectorData::Datetime(items) => filled(kind, items)?,
    };
    k.set_attribute(v.attribute);
    Ok(k)
}

fn encode_list(items: &[StaticValue]) -> Result<K, BridgeError> {
    tracing::trace!(len = items.len(), "encoding mixed list");
    let mut list = K::list(Vec::with_capacity(items.len()));
    for item in items {
        let child = encode(item)?;
        list.push(child)?;
    }
    Ok(list)
}

fn encode_table(t: &Table) -> Result<K, BridgeError> {
    tracing::trace!(columns = t.columns.len(), "encoding table");
    let names = symbol_vector(&t.column_names.names, t.column_names.attribute)?;
    let columns = encode_list(&t.columns)?;
    let mut dict = K::dict(names, columns);
    dict.set_attribute(t.attribute);
    Ok(K::table(dict)?)
}

fn encode_dict(d: &Dict) -> Result<K, BridgeError> {
    let keys = encode(&d.keys)?;
    let values = encode(&d.values)?;
    let mut dict = K::dict(keys, values);
    dict.set_attribute(d.attribute);
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use qbridge_kobj::Atom;

    use super::*;

    #[test]
    fn month_atom_is_a_retyped_integer() {
        let k = encode(&Scalar::Month(300).into()).unwrap();
        assert_eq!(k.type_tag(), Some(TypeTag::Atom(Kind::Month)));
        assert_eq!(k.atom(), Some(&Atom::Int32(300)));
    }

    #[test]
    fn symbol_atoms_share_interned_text() {
        let a = encode(&StaticValue::symbol("ibm")).unwrap();
        let b = encode(&StaticValue::symbol("ibm")).unwrap();
        match (a.atom(), b.atom()) {
            (Some(Atom::Symbol(x)), Some(Atom::Symbol(y))) => assert!(x.ptr_eq(y)),
            other => panic!("expected symbol atoms, got {other:?}"),
        }
    }

    #[test]
    fn sorted_symbol_vector_carries_its_attribute() {
        let v = StaticValue::symbols(["a", "b", "c"]).with_attribute(Attribute::Sorted);
        let k = encode(&v).unwrap();
        assert_eq!(k.type_tag(), Some(TypeTag::Vector(Kind::Symbol)));
        assert_eq!(k.len(), 3);
        assert_eq!(k.attribute(), Ok(Attribute::Sorted));
    }

    #[test]
    fn bool_vector_is_one_byte_per_element() {
        let k = encode(&VectorData::Bool(vec![true, false, true]).into()).unwrap();
        assert_eq!(k.bytes(), Some(&[1u8, 0, 1][..]));
    }

    #[test]
    fn bulk_fill_refuses_a_vector_without_a_byte_buffer() {
        let err = filled(Kind::Symbol, &[0u8]).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedValueKind(ref m) if m.contains("fill")));
    }

    #[test]
    fn float_vector_bytes_are_native_endian() {
        let k = encode(&VectorData::Float64(vec![1.5, -2.0]).into()).unwrap();
        let mut expected = 1.5f64.to_ne_bytes().to_vec();
        expected.extend_from_slice(&(-2.0f64).to_ne_bytes());
        assert_eq!(k.bytes(), Some(expected.as_slice()));
    }

    #[test]
    fn table_becomes_a_flipped_dictionary() {
        let t = Table::new(
            ["a", "b"],
            vec![
                VectorData::Int64(vec![1, 2]).into(),
                StaticValue::symbols(["x", "y"]),
            ],
        );
        let k = encode(&t.into()).unwrap();
        assert_eq!(k.type_tag(), Some(TypeTag::Table));
        let dict = &k.children().unwrap()[0];
        assert_eq!(dict.type_tag(), Some(TypeTag::Dict));
        let [names, columns] = dict.children().unwrap() else {
            panic!("dictionary without keys and values");
        };
        let names: Vec<&str> = names.symbols().unwrap().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn table_with_mismatched_names_is_refused() {
        let t = Table::new(["a", "b"], vec![VectorData::Int64(vec![1]).into()]);
        assert!(matches!(encode(&t.into()), Err(BridgeError::UnsupportedValueKind(_))));
    }

    #[test]
    fn nested_list_children_are_owned_by_the_parent() {
        let v = StaticValue::MixedList(vec![
            Scalar::Int64(1).into(),
            StaticValue::MixedList(vec![StaticValue::symbol("x"), StaticValue::Unit]),
        ]);
        let k = encode(&v).unwrap();
        let items = k.children().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].children().map(<[K]>::len), Some(2));
        assert!(items.iter().all(|item| item.ref_count() == 1));
    }
}

use std::fmt;
use std::sync::Arc;

use crate::error::KError;
use crate::kind::{Attribute, Kind, TypeTag};
use crate::symbol::{intern, Symbol};

/// Atom payload by storage layout.
///
/// Month, date, minute, second and time atoms live in `Int32`; datetime lives
/// in `Float64`. The object's type code says which kind it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Char(u8),
    Symbol(Symbol),
}

#[derive(Debug, Clone)]
enum Body {
    Empty,
    Atom(Atom),
    /// Fixed-width vector elements, native endian, contiguous.
    Raw(Vec<u8>),
    Symbols(Vec<Symbol>),
    /// Mixed list items, dictionary `[keys, values]`, or table `[dict]`.
    Children(Vec<K>),
    Error(String),
    Opaque(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Object {
    code: i8,
    attr: u8,
    body: Body,
}

/// Owned handle to a reference-counted engine object.
///
/// `clone()` takes another reference, dropping a handle releases one. An
/// object is freed when its last handle goes away, so every handle is
/// released exactly once on every exit path.
///
/// Mutating operations act on the handle's own object. If the object is
/// shared, it is copied first and the handle moves to the copy; other handles
/// keep seeing the old object.
#[derive(Clone)]
pub struct K(Arc<Object>);

impl K {
    fn with_body(code: i8, body: Body) -> K {
        K(Arc::new(Object { code, attr: 0, body }))
    }

    fn atom_of(kind: Kind, atom: Atom) -> K {
        K::with_body(TypeTag::Atom(kind).code(), Body::Atom(atom))
    }

    // ───────────────────────────────────────────────────────────
    //  Atom constructors
    // ───────────────────────────────────────────────────────────

    pub fn bool(v: bool) -> K {
        K::atom_of(Kind::Bool, Atom::Bool(v))
    }

    pub fn byte(v: u8) -> K {
        K::atom_of(Kind::Byte, Atom::Byte(v))
    }

    pub fn short(v: i16) -> K {
        K::atom_of(Kind::Int16, Atom::Int16(v))
    }

    pub fn int(v: i32) -> K {
        K::atom_of(Kind::Int32, Atom::Int32(v))
    }

    pub fn long(v: i64) -> K {
        K::atom_of(Kind::Int64, Atom::Int64(v))
    }

    pub fn real(v: f32) -> K {
        K::atom_of(Kind::Float32, Atom::Float32(v))
    }

    pub fn float(v: f64) -> K {
        K::atom_of(Kind::Float64, Atom::Float64(v))
    }

    pub fn char(v: u8) -> K {
        K::atom_of(Kind::Char, Atom::Char(v))
    }

    /// Symbol atom. The symbol is already interned by construction.
    pub fn symbol(sym: Symbol) -> K {
        K::atom_of(Kind::Symbol, Atom::Symbol(sym))
    }

    /// Datetime atom: day count with the time of day as the fraction.
    pub fn datetime(v: f64) -> K {
        K::atom_of(Kind::Datetime, Atom::Float64(v))
    }

    /// Time atom: milliseconds since midnight.
    pub fn time(v: i32) -> K {
        K::atom_of(Kind::Time, Atom::Int32(v))
    }

    /// Change the kind of an atom whose storage layout already fits.
    ///
    /// The engine has no public constructors for month, date, minute and
    /// second atoms; they are built as integer atoms and retyped.
    pub fn retype_atom(&mut self, kind: Kind) -> Result<(), KError> {
        let fits = match &self.0.body {
            Body::Atom(Atom::Int32(_)) => kind.is_int32_family(),
            Body::Atom(Atom::Float64(_)) => matches!(kind, Kind::Float64 | Kind::Datetime),
            _ => false,
        };
        if !fits {
            return Err(KError::Shape { op: "retype_atom", code: self.type_code() });
        }
        Arc::make_mut(&mut self.0).code = TypeTag::Atom(kind).code();
        Ok(())
    }

    // ───────────────────────────────────────────────────────────
    //  Vector, list and container constructors
    // ───────────────────────────────────────────────────────────

    /// Vector of `len` zeroed elements. Symbol vectors hold the empty symbol.
    pub fn vector(kind: Kind, len: usize) -> K {
        let body = match kind.width() {
            Some(width) => Body::Raw(vec![0; len * width]),
            None => Body::Symbols(vec![intern(""); len]),
        };
        K::with_body(TypeTag::Vector(kind).code(), body)
    }

    /// Fixed-width vector taking ownership of a raw native-endian buffer.
    pub fn vector_from_bytes(kind: Kind, bytes: Vec<u8>) -> Result<K, KError> {
        match kind.width() {
            Some(width) if bytes.len() % width == 0 => {
                Ok(K::with_body(TypeTag::Vector(kind).code(), Body::Raw(bytes)))
            }
            _ => Err(KError::Width { kind, bytes: bytes.len() }),
        }
    }

    /// Mixed list owning `items`.
    pub fn list(items: Vec<K>) -> K {
        K::with_body(TypeTag::MIXED_LIST, Body::Children(items))
    }

    /// Dictionary owning its key and value objects.
    pub fn dict(keys: K, values: K) -> K {
        K::with_body(TypeTag::DICT, Body::Children(vec![keys, values]))
    }

    /// Turn a column dictionary into a table.
    ///
    /// Keys must be a symbol vector and values a mixed list with one column
    /// per key. The table carries the dictionary's attribute.
    pub fn table(dict: K) -> Result<K, KError> {
        if dict.type_code() != TypeTag::DICT {
            return Err(KError::Table(format!(
                "expected a dictionary, got type {}",
                dict.type_code()
            )));
        }
        let (names, columns) = match dict.children() {
            Some([names, columns]) => (names, columns),
            _ => return Err(KError::Table("dictionary without keys and values".into())),
        };
        if names.type_code() != TypeTag::Vector(Kind::Symbol).code() {
            return Err(KError::Table(format!(
                "column names must be a symbol vector, got type {}",
                names.type_code()
            )));
        }
        if columns.type_code() != TypeTag::MIXED_LIST {
            return Err(KError::Table(format!(
                "columns must be a mixed list, got type {}",
                columns.type_code()
            )));
        }
        if names.len() != columns.len() {
            return Err(KError::Table(format!(
                "{} column names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let attr = dict.0.attr;
        Ok(K(Arc::new(Object {
            code: TypeTag::TABLE,
            attr,
            body: Body::Children(vec![dict]),
        })))
    }

    /// Error object carrying the engine's message.
    pub fn error(message: impl Into<String>) -> K {
        K::with_body(TypeTag::ERROR, Body::Error(message.into()))
    }

    /// The void result.
    pub fn unit() -> K {
        K::with_body(TypeTag::UNIT, Body::Empty)
    }

    /// Lambda, operator or projection with an opaque body.
    pub fn function(tag: TypeTag, body: Vec<u8>) -> Result<K, KError> {
        if !tag.is_function() {
            return Err(KError::Shape { op: "function", code: tag.code() });
        }
        Ok(K::with_body(tag.code(), Body::Opaque(body)))
    }

    /// Object with an arbitrary type code and opaque payload, for values a
    /// transport received but cannot represent.
    pub fn opaque(code: i8, body: Vec<u8>) -> K {
        K::with_body(code, Body::Opaque(body))
    }

    /// Object with an arbitrary type code owning `items`, as received from a
    /// transport. No shape checks.
    pub fn container(code: i8, items: Vec<K>) -> K {
        K::with_body(code, Body::Children(items))
    }

    // ───────────────────────────────────────────────────────────
    //  Accessors
    // ───────────────────────────────────────────────────────────

    pub fn type_code(&self) -> i8 {
        self.0.code
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        TypeTag::from_code(self.0.code)
    }

    pub fn attribute_byte(&self) -> u8 {
        self.0.attr
    }

    pub fn attribute(&self) -> Result<Attribute, KError> {
        Attribute::try_from(self.0.attr)
    }

    pub fn set_attribute(&mut self, attribute: Attribute) {
        Arc::make_mut(&mut self.0).attr = attribute.as_u8();
    }

    /// Store an attribute byte verbatim, known or not.
    pub fn set_attribute_byte(&mut self, raw: u8) {
        Arc::make_mut(&mut self.0).attr = raw;
    }

    /// Number of live handles to this object.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Element count for vectors, item count for lists and containers,
    /// 1 for atoms, 0 otherwise.
    pub fn len(&self) -> usize {
        match &self.0.body {
            Body::Atom(_) => 1,
            Body::Raw(bytes) => Kind::from_code(self.0.code)
                .and_then(Kind::width)
                .map_or(bytes.len(), |width| bytes.len() / width),
            Body::Symbols(syms) => syms.len(),
            Body::Children(items) => items.len(),
            Body::Empty | Body::Error(_) | Body::Opaque(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn atom(&self) -> Option<&Atom> {
        match &self.0.body {
            Body::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Raw element buffer of a fixed-width vector.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.0.body {
            Body::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match &mut Arc::make_mut(&mut self.0).body {
            Body::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn symbols(&self) -> Option<&[Symbol]> {
        match &self.0.body {
            Body::Symbols(syms) => Some(syms),
            _ => None,
        }
    }

    /// Items of a mixed list, `[keys, values]` of a dictionary, `[dict]` of a
    /// table.
    pub fn children(&self) -> Option<&[K]> {
        match &self.0.body {
            Body::Children(items) => Some(items),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.0.body {
            Body::Error(message) => Some(message),
            _ => None,
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Appends
    // ───────────────────────────────────────────────────────────

    /// Append an interned symbol to a symbol vector.
    pub fn push_symbol(&mut self, sym: Symbol) -> Result<(), KError> {
        let code = self.type_code();
        match &mut Arc::make_mut(&mut self.0).body {
            Body::Symbols(syms) => {
                syms.push(sym);
                Ok(())
            }
            _ => Err(KError::Shape { op: "push_symbol", code }),
        }
    }

    /// Append an item to a mixed list. The list takes ownership of `item`.
    pub fn push(&mut self, item: K) -> Result<(), KError> {
        let code = self.type_code();
        if code != TypeTag::MIXED_LIST {
            return Err(KError::Shape { op: "push", code });
        }
        match &mut Arc::make_mut(&mut self.0).body {
            Body::Children(items) => {
                items.push(item);
                Ok(())
            }
            _ => Err(KError::Shape { op: "push", code }),
        }
    }
}

impl fmt::Debug for K {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("K");
        s.field("type", &self.0.code);
        if self.0.attr != 0 {
            s.field("attr", &self.0.attr);
        }
        match &self.0.body {
            Body::Empty => {}
            Body::Atom(atom) => {
                s.field("atom", atom);
            }
            Body::Raw(bytes) => {
                s.field("len", &self.len()).field("bytes", &bytes.len());
            }
            Body::Symbols(syms) => {
                s.field("symbols", syms);
            }
            Body::Children(items) => {
                s.field("items", items);
            }
            Body::Error(message) => {
                s.field("error", message);
            }
            Body::Opaque(body) => {
                s.field("opaque", &body.len());
            }
        }
        s.finish()
    }
}

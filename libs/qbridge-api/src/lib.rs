pub mod error;
pub mod ffi;
pub mod tag_map;
pub mod transport;
pub mod value;

pub use qbridge_kobj::{intern, Attribute, Kind, Symbol, TypeTag, K};

pub use error::{BridgeError, ErrorKind, PluginError};
pub use ffi::{
    AbiVersionFn, CreateTransportFn, CreatedTransport, DestroyTransportFn, QB_ABI_VERSION,
};
pub use tag_map::StaticTag;
pub use transport::{SendMode, Transport};
pub use value::{Dict, Scalar, StaticValue, SymbolVector, Table, Vector, VectorData};

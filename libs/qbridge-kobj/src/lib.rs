//! Engine-side object model.
//!
//! A `K` is an owned handle to a reference-counted engine object. The codec
//! only ever talks to engine values through this crate: type codes, raw
//! vector buffers, child handles and the constructors the engine exposes.

pub mod error;
pub mod kind;
pub mod object;
pub mod symbol;

pub use error::KError;
pub use kind::{Attribute, Kind, TypeTag};
pub use object::{Atom, K};
pub use symbol::{intern, Symbol};

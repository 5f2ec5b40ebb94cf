//! Conversion between engine objects (`K`) and `StaticValue` trees.
//!
//! Both directions recurse directly over the value. Compound values are
//! built child first: a child is converted completely into a local before it
//! is stored into its parent, and attributes are stamped only after every
//! append that may move a container to new storage.

pub mod decode;
pub mod encode;

pub use decode::decode;
pub use encode::encode;

/// Misuse of an engine constructor or accessor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KError {
    #[error("attribute byte {0} is not a known attribute")]
    InvalidAttribute(u8),

    #[error("{op}: not applicable to an object of type {code}")]
    Shape { op: &'static str, code: i8 },

    #[error("{kind} vector buffer of {bytes} bytes is not a whole number of elements")]
    Width { kind: crate::Kind, bytes: usize },

    #[error("table: {0}")]
    Table(String),
}
